#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use engine_lifecycle::{Coordinator, EngineError, EngineFn, EngineRef, LifecycleState};
use futures::StreamExt;

pub const WAIT: Duration = Duration::from_secs(5);

/// One-shot latch a blocking engine body can wait on.
#[derive(Default)]
pub struct Latch {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Latch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

/// Counters and an overlap detector shared by a recording engine.
#[derive(Default)]
pub struct Probe {
    pub inits: AtomicUsize,
    pub deploys: AtomicUsize,
    pub active: AtomicUsize,
    pub overlapped: AtomicBool,
    pub log: Mutex<Vec<&'static str>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self, what: &'static str) {
        if self.active.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.log.lock().unwrap().push(what);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn deploys(&self) -> usize {
        self.deploys.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    pub fn push(&self, what: &'static str) {
        self.log.lock().unwrap().push(what);
    }
}

/// Engine whose bodies sleep for the given durations and report to `probe`.
pub fn sleepy_engine(probe: &Arc<Probe>, init: Duration, deploy: Duration) -> EngineRef {
    let pi = probe.clone();
    let pd = probe.clone();
    EngineFn::arc(
        "sleepy",
        move || {
            pi.enter("init");
            std::thread::sleep(init);
            pi.inits.fetch_add(1, Ordering::SeqCst);
            pi.leave();
            Ok(())
        },
        move || {
            pd.enter("deploy");
            std::thread::sleep(deploy);
            pd.deploys.fetch_add(1, Ordering::SeqCst);
            pd.leave();
            Ok(())
        },
    )
}

/// Engine whose init blocks until `latch` opens.
pub fn latched_engine(probe: &Arc<Probe>, latch: &Arc<Latch>) -> EngineRef {
    let pi = probe.clone();
    let pd = probe.clone();
    let l = latch.clone();
    EngineFn::arc(
        "latched",
        move || {
            pi.enter("init");
            l.wait();
            pi.inits.fetch_add(1, Ordering::SeqCst);
            pi.leave();
            Ok(())
        },
        move || {
            pd.enter("deploy");
            pd.deploys.fetch_add(1, Ordering::SeqCst);
            pd.leave();
            Ok(())
        },
    )
}

/// Engine whose init fails the first `failures` times.
pub fn flaky_engine(probe: &Arc<Probe>, failures: usize) -> EngineRef {
    let pi = probe.clone();
    let pd = probe.clone();
    EngineFn::arc(
        "flaky",
        move || {
            let n = pi.inits.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                Err(EngineError::failed(format!("attempt {n} failed")))
            } else {
                Ok(())
            }
        },
        move || {
            pd.deploys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    )
}

/// Waits until the coordinator reports `target`, failing the test on timeout.
pub async fn wait_for(c: &Coordinator, target: LifecycleState) {
    let mut status = c.observe_status();
    let reached = tokio::time::timeout(WAIT, async {
        while let Some(s) = status.next().await {
            if s == target {
                return;
            }
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {target}");
}

/// Polls `cond` until it holds, failing the test on timeout.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    let ok = tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(ok.is_ok(), "condition not met in time");
}

/// Shared, ordered record of task ids that ran.
pub type Ran = Arc<Mutex<Vec<usize>>>;

pub fn recorder() -> Ran {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(ran: &Ran, id: usize) -> impl FnOnce() + Send + 'static {
    let ran = ran.clone();
    move || ran.lock().unwrap().push(id)
}
