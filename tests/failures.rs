//! Engine body failures, retries and event delivery to subscribers.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use engine_lifecycle::{
    Coordinator, CoordinatorConfig, EngineError, EngineFn, EngineRef, Event, EventKind,
    LifecycleError, LifecycleState, LogWriter, Subscribe,
};

use common::*;

fn corrupt_dictionary() -> Result<(), EngineError> {
    panic!("dictionary corrupt")
}

fn blow_up() {
    panic!("task blew up")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_init_is_observable_and_keeps_tasks() {
    let probe = Probe::new();
    let c = Coordinator::builder(flaky_engine(&probe, 1))
        .with_config(CoordinatorConfig {
            retry_failed_init: false,
            ..CoordinatorConfig::default()
        })
        .build()
        .unwrap();
    let ran = recorder();

    c.startup(Some(Box::new(record(&ran, 1))));
    wait_for(&c, LifecycleState::Failed).await;
    assert!(!c.is_ready());
    assert_eq!(c.pending(), 1);

    // Retry disabled: triggers leave a failed engine alone.
    c.run_check();
    c.startup(None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(probe.inits(), 1);
    assert_eq!(c.state(), LifecycleState::Failed);
    assert!(ran.lock().unwrap().is_empty());

    // A deploy recovers the engine and releases the queue.
    assert!(c.deploy().await);
    assert!(c.is_ready());
    eventually(|| ran.lock().unwrap().len() == 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_init_is_retried_by_the_next_trigger() {
    let probe = Probe::new();
    let c = Coordinator::builder(flaky_engine(&probe, 2)).build().unwrap();
    let ran = recorder();

    c.startup(Some(Box::new(record(&ran, 1))));
    wait_for(&c, LifecycleState::Failed).await;

    c.run_after_started(record(&ran, 2));
    wait_for(&c, LifecycleState::Failed).await;
    eventually(|| probe.inits() == 2).await;

    c.run_check();
    wait_for(&c, LifecycleState::Ready).await;
    eventually(|| ran.lock().unwrap().len() == 2).await;

    assert_eq!(probe.inits(), 3);
    assert_eq!(*ran.lock().unwrap(), vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_init_does_not_wedge_the_coordinator() {
    let engine: EngineRef = EngineFn::arc("broken", corrupt_dictionary, || Ok(()));
    let c = Coordinator::builder(engine).build().unwrap();
    let mut events = c.events();

    c.startup(None);
    wait_for(&c, LifecycleState::Failed).await;

    let failed = loop {
        let ev = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
        if ev.kind == EventKind::InitFailed {
            break ev;
        }
    };
    assert!(failed.error.as_deref().unwrap().contains("dictionary corrupt"));

    // The runtime survived; the engine can still be redeployed.
    assert!(c.deploy().await);
    assert!(c.is_ready());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_deploy_reports_the_reason() {
    let engine: EngineRef = EngineFn::arc(
        "schema",
        || Ok(()),
        || Err(EngineError::failed("bad schema")),
    );
    let c = Coordinator::builder(engine).build().unwrap();
    c.startup(None);
    wait_for(&c, LifecycleState::Ready).await;

    let err = c.try_deploy().await.unwrap_err();
    assert_eq!(
        err,
        LifecycleError::DeployFailed {
            source: EngineError::failed("bad schema")
        }
    );
    assert_eq!(c.state(), LifecycleState::Failed);
    assert!(!c.deploy().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_deploy_does_not_reinitialize() {
    let inits = Arc::new(AtomicUsize::new(0));
    let broken = Arc::new(AtomicBool::new(true));
    let (i, b) = (inits.clone(), broken.clone());
    let engine: EngineRef = EngineFn::arc(
        "schema",
        move || {
            i.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        move || {
            if b.load(Ordering::SeqCst) {
                Err(EngineError::failed("bad"))
            } else {
                Ok(())
            }
        },
    );
    let c = Coordinator::builder(engine).build().unwrap();
    c.startup(None);
    wait_for(&c, LifecycleState::Ready).await;

    assert!(!c.deploy().await);
    assert_eq!(c.state(), LifecycleState::Failed);

    let ran = recorder();
    c.run_after_started(record(&ran, 1));
    c.startup(None);
    c.run_check();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert_eq!(c.state(), LifecycleState::Failed);
    assert_eq!(c.pending(), 1);

    // Only a deploy brings a once-loaded engine back.
    broken.store(false, Ordering::SeqCst);
    assert!(c.deploy().await);
    eventually(|| ran.lock().unwrap().len() == 1).await;
    assert_eq!(inits.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_task_does_not_stop_the_drain() {
    let probe = Probe::new();
    let c = Coordinator::builder(sleepy_engine(&probe, Duration::from_millis(10), Duration::ZERO))
        .build()
        .unwrap();
    let ran = recorder();

    c.run_after_started(record(&ran, 1));
    c.run_after_started(blow_up);
    c.run_after_started(record(&ran, 3));

    eventually(|| ran.lock().unwrap().len() == 2).await;
    assert_eq!(*ran.lock().unwrap(), vec![1, 3]);
    assert_eq!(c.pending(), 0);
}

struct Kinds(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Kinds {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "kinds"
    }
}

struct Counter(AtomicUsize);

#[async_trait]
impl Subscribe for Counter {
    async fn on_event(&self, _ev: &Event) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_receive_lifecycle_events() {
    let probe = Probe::new();
    let kinds = Arc::new(Kinds(Mutex::new(Vec::new())));
    let counter = Arc::new(Counter(AtomicUsize::new(0)));
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        kinds.clone() as Arc<dyn Subscribe>,
        counter.clone() as Arc<dyn Subscribe>,
        Arc::new(LogWriter::new()),
    ];
    let c = Coordinator::builder(sleepy_engine(&probe, Duration::from_millis(5), Duration::ZERO))
        .with_subscribers(subs)
        .build()
        .unwrap();

    c.run_after_started(|| {});
    wait_for(&c, LifecycleState::Ready).await;
    eventually(|| kinds.0.lock().unwrap().contains(&EventKind::TasksDrained)).await;

    assert_eq!(
        *kinds.0.lock().unwrap(),
        vec![
            EventKind::InitStarted,
            EventKind::InitCompleted,
            EventKind::TasksDrained
        ]
    );
    eventually(|| counter.0.load(Ordering::SeqCst) == 3).await;
}
