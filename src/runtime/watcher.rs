//! # Watchers: bind a trigger kind to a worker and a dispatch policy.
//!
//! A [`Watcher`] is registered on the [`Bus`](crate::events::Bus) once, when
//! the orchestrator is built, and stays registered for its whole lifetime.
//! The bus calls [`Dispatch::dispatch`] synchronously for every matching
//! event; the watcher spawns the worker on the runtime and returns.
//!
//! ## Architecture
//! ```text
//! Bus.emit(trigger) ──► Watcher.dispatch(&event)
//!                          ├─ runtime stopped?  → drop trigger
//!                          ├─ LatestWins        → cancel previous handle, remember new one
//!                          └─ spawn run_worker(worker, event, Effects{child token})
//!                                    └─ on exit: forget handle if still current
//! ```
//!
//! ## Rules
//! - Cancelling the previous worker happens inside `emit`, before the new
//!   worker is even spawned, so two triggers emitted back to back leave the
//!   first one unable to schedule any effect.
//! - Every worker token is a child of the orchestrator token: shutdown
//!   cancels all runs at once.
//! - Workers are tracked by the orchestrator's [`TaskTracker`] for graceful
//!   shutdown.

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::events::{Dispatch, Event, EventKind};
use crate::workers::WorkerRef;

use super::effects::{Deps, Effects};
use super::policy::DispatchPolicy;
use super::runner::run_worker;

/// Declarative description of a watcher.
#[derive(Clone)]
pub struct WatcherSpec {
    name: Cow<'static, str>,
    trigger: EventKind,
    policy: DispatchPolicy,
    worker: WorkerRef,
}

impl WatcherSpec {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        trigger: EventKind,
        policy: DispatchPolicy,
        worker: WorkerRef,
    ) -> Self {
        Self {
            name: name.into(),
            trigger,
            policy,
            worker,
        }
    }

    /// Convenience: `LatestWins` watcher.
    #[inline]
    pub fn latest_wins(
        name: impl Into<Cow<'static, str>>,
        trigger: EventKind,
        worker: WorkerRef,
    ) -> Self {
        Self::new(name, trigger, DispatchPolicy::LatestWins, worker)
    }

    /// Convenience: `RunAll` watcher.
    #[inline]
    pub fn run_all(
        name: impl Into<Cow<'static, str>>,
        trigger: EventKind,
        worker: WorkerRef,
    ) -> Self {
        Self::new(name, trigger, DispatchPolicy::RunAll, worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> EventKind {
        self.trigger
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }
}

/// Ownership record of the most recent worker of a `LatestWins` watcher.
struct WorkerHandle {
    generation: u64,
    trigger_seq: u64,
    cancel: CancellationToken,
}

/// A registered watcher.
pub struct Watcher {
    name: Arc<str>,
    trigger: EventKind,
    policy: DispatchPolicy,
    worker: WorkerRef,
    deps: Arc<Deps>,
    runtime_token: CancellationToken,
    tracker: TaskTracker,
    handle: Handle,
    generation: AtomicU64,
    current: Arc<Mutex<Option<WorkerHandle>>>,
}

impl Watcher {
    pub(crate) fn new(
        spec: WatcherSpec,
        deps: Arc<Deps>,
        runtime_token: CancellationToken,
        tracker: TaskTracker,
        handle: Handle,
    ) -> Self {
        Self {
            name: Arc::from(spec.name.as_ref()),
            trigger: spec.trigger,
            policy: spec.policy,
            worker: spec.worker,
            deps,
            runtime_token,
            tracker,
            handle,
            generation: AtomicU64::new(0),
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Number of workers spawned so far.
    pub fn dispatched(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Seq of the trigger whose worker is current (`LatestWins` only).
    pub fn current_trigger(&self) -> Option<u64> {
        self.current.lock().as_ref().map(|h| h.trigger_seq)
    }
}

impl Dispatch for Watcher {
    fn trigger(&self) -> EventKind {
        self.trigger
    }

    fn dispatch(&self, event: &Arc<Event>) {
        if self.runtime_token.is_cancelled() {
            debug!(watcher = %self.name, seq = event.seq, "runtime stopped; trigger dropped");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.runtime_token.child_token();

        if self.policy == DispatchPolicy::LatestWins {
            let previous = self.current.lock().replace(WorkerHandle {
                generation,
                trigger_seq: event.seq,
                cancel: token.clone(),
            });
            if let Some(prev) = previous {
                prev.cancel.cancel();
                debug!(
                    watcher = %self.name,
                    superseded = prev.trigger_seq,
                    by = event.seq,
                    "previous worker superseded"
                );
            }
        }

        let fx = Effects::new(Arc::clone(&self.deps), token, Arc::clone(&self.name));
        let worker = Arc::clone(&self.worker);
        let trigger = Arc::clone(event);
        let current = Arc::clone(&self.current);

        self.tracker.spawn_on(
            async move {
                run_worker(worker, trigger, fx).await;
                let mut slot = current.lock();
                if slot.as_ref().is_some_and(|h| h.generation == generation) {
                    *slot = None;
                }
            },
            &self.handle,
        );
    }
}
