//! # Run a single worker to completion.
//!
//! Executes one [`Worker`] for one trigger event and classifies how it ended.
//!
//! ## Outcomes
//! ```text
//! worker.run() → Ok(())            → Completed   (terminal event already emitted)
//! worker.run() → Err(Canceled)     → Superseded  (silent: no event)
//! worker.run() → Err(other)        → Escaped     (logged; workers should not do this)
//! worker.run() panics              → Panicked    (caught, logged)
//! ```
//!
//! ## Rules
//! - The runner never emits events itself; terminal events belong to workers.
//! - Panics are isolated with `catch_unwind` so one broken worker cannot take
//!   down its watcher or the orchestrator.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::error::FlowError;
use crate::events::Event;
use crate::workers::Worker;

use super::effects::Effects;

/// How a worker run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Completed,
    Superseded,
    Escaped(FlowError),
    Panicked(String),
}

/// Runs `worker` for `trigger` and reports the exit.
pub(crate) async fn run_worker(worker: Arc<dyn Worker>, trigger: Arc<Event>, fx: Effects) -> WorkerExit {
    let watcher = fx.worker().to_string();
    debug!(
        watcher = %watcher,
        worker = worker.name(),
        trigger = %trigger.kind(),
        seq = trigger.seq,
        "worker started"
    );

    let run = AssertUnwindSafe(worker.run(Arc::clone(&trigger), fx)).catch_unwind();
    let exit = match run.await {
        Ok(Ok(())) => WorkerExit::Completed,
        Ok(Err(FlowError::Canceled)) => WorkerExit::Superseded,
        Ok(Err(e)) => WorkerExit::Escaped(e),
        Err(panic) => WorkerExit::Panicked(panic_message(&*panic)),
    };

    match &exit {
        WorkerExit::Completed => {
            debug!(watcher = %watcher, seq = trigger.seq, "worker completed");
        }
        WorkerExit::Superseded => {
            debug!(watcher = %watcher, seq = trigger.seq, "worker cancelled");
        }
        WorkerExit::Escaped(e) => {
            warn!(
                watcher = %watcher,
                seq = trigger.seq,
                label = e.as_label(),
                error = %e,
                "worker returned an unreported error"
            );
        }
        WorkerExit::Panicked(msg) => {
            error!(watcher = %watcher, seq = trigger.seq, panic = %msg, "worker panicked");
        }
    }
    exit
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
