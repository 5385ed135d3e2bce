//! # Example: redeploy
//!
//! A keyboard-like front end sharing one slow dictionary engine.
//!
//! Shows how to:
//! - Build a [`Coordinator`] with a storage check, a dependent notifier and a
//!   dedicated "UI" thread for deferred work.
//! - Queue work before the engine is ready with `startup` / `run_after_started`.
//! - Follow the lifecycle with `observe_status` and the built-in [`LogWriter`].
//! - Redeploy while other callers keep asking (busy callers get `false`).
//!
//! ## Flow
//! ```text
//! startup(show candidates) ──► InProgress ──► init (300ms) ──► Ready ──► ui: show candidates
//! run_after_started(...)   ──► queued ───────────────────────────────► ui: restore draft
//! deploy() x2 at once      ──► one wins: notify "directory changed" ─► deploy (200ms) ─► Ready
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example redeploy
//! ```

use std::sync::Arc;
use std::time::Duration;

use engine_lifecycle::{
    Coordinator, CoordinatorConfig, DispatchExecutor, EngineFn, EngineRef, LogWriter, Subscribe,
};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

fn load_dictionary() -> Result<(), engine_lifecycle::EngineError> {
    std::thread::sleep(Duration::from_millis(300));
    Ok(())
}

fn rebuild_dictionary() -> Result<(), engine_lifecycle::EngineError> {
    std::thread::sleep(Duration::from_millis(200));
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine: EngineRef = EngineFn::arc("dictionary", load_dictionary, rebuild_dictionary);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let coordinator = Coordinator::builder(engine)
        .with_config(CoordinatorConfig {
            slow_body_warning: Duration::from_millis(250),
            ..CoordinatorConfig::default()
        })
        .with_storage(|| std::path::Path::new(".").exists())
        .with_notifier(|| println!("[theme] user directory changed, reloading"))
        .with_executor(DispatchExecutor::spawn("ui")?)
        .with_subscribers(subs)
        .build()?;

    let watcher = {
        let mut status = coordinator.observe_status();
        tokio::spawn(async move {
            while let Some(state) = status.next().await {
                println!("[status] {state}");
            }
        })
    };

    coordinator.startup(Some(Box::new(|| println!("[ui] show candidates"))));
    coordinator.run_after_started(|| println!("[ui] restore draft"));

    tokio::time::sleep(Duration::from_millis(500)).await;

    let (a, b) = tokio::join!(coordinator.deploy(), coordinator.deploy());
    println!("[main] concurrent deploys: {a} / {b}");

    coordinator.run_after_started(|| println!("[ui] refresh after deploy"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    drop(coordinator);
    let _ = tokio::time::timeout(Duration::from_millis(100), watcher).await;
    Ok(())
}
