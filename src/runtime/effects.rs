//! # Effects: the only way a worker touches the outside world.
//!
//! Each worker run gets its own [`Effects`] handle bound to a cancellation
//! token. Every effect checks the token before it is scheduled, so a worker
//! superseded under latest-wins stops at its next step without emitting
//! anything further.
//!
//! | Effect | Suspends | Cancellation |
//! |--------|----------|--------------|
//! | [`put`](Effects::put) | no | checked before emitting |
//! | [`take`](Effects::take) / [`put_and_take`](Effects::put_and_take) | until a matching event | aborts the wait |
//! | [`call`](Effects::call) | until the executor answers | checked before and after; the call itself runs to completion |
//! | [`delay`](Effects::delay) | for the given duration | aborts the sleep |
//! | [`persist`](Effects::persist) | no | checked before writing |
//! | [`persist_all`](Effects::persist_all) | no | checked once; failed writes roll back |
//!
//! Reads of the application state ([`session`](Effects::session),
//! [`select`](Effects::select)) are not effects and never fail.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::config::Config;
use crate::error::FlowError;
use crate::events::{Action, Bus, Event, EventKind, Pending};
use crate::io::{ApiResult, Request, RequestExecutor, Storage};
use crate::store::{AppState, SessionStore, Store};

/// Dependencies shared by every worker of one orchestrator.
pub(crate) struct Deps {
    pub(crate) config: Config,
    pub(crate) bus: Bus,
    pub(crate) store: Arc<Store>,
    pub(crate) executor: Arc<dyn RequestExecutor>,
    pub(crate) storage: Arc<dyn Storage>,
}

/// Effect handle of one worker run.
#[derive(Clone)]
pub struct Effects {
    deps: Arc<Deps>,
    token: CancellationToken,
    worker: Arc<str>,
}

impl Effects {
    pub(crate) fn new(deps: Arc<Deps>, token: CancellationToken, worker: Arc<str>) -> Self {
        Self {
            deps,
            token,
            worker,
        }
    }

    /// Name of the watcher that spawned this run.
    pub fn worker(&self) -> &str {
        &self.worker
    }

    pub fn config(&self) -> &Config {
        &self.deps.config
    }

    /// True once this run was superseded or the orchestrator is shutting down.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn ensure_active(&self) -> Result<(), FlowError> {
        if self.token.is_cancelled() {
            trace!(worker = %self.worker, "effect skipped: cancelled");
            Err(FlowError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Emits an action.
    pub fn put(&self, action: Action) -> Result<Arc<Event>, FlowError> {
        self.ensure_active()?;
        Ok(self.deps.bus.emit(action))
    }

    /// Suspends until one of `kinds` is emitted. Never times out.
    pub async fn take(&self, kinds: &[EventKind]) -> Result<Arc<Event>, FlowError> {
        self.ensure_active()?;
        let pending = self.deps.bus.wait_for_until(kinds, &self.token);
        self.settle(pending).await
    }

    /// Emits `action`, then suspends until one of `kinds` is emitted.
    ///
    /// The wait is registered before the action goes out, so a reply emitted
    /// synchronously by the dispatched workflow is still observed.
    pub async fn put_and_take(
        &self,
        action: Action,
        kinds: &[EventKind],
    ) -> Result<Arc<Event>, FlowError> {
        self.ensure_active()?;
        let pending = self.deps.bus.wait_for_until(kinds, &self.token);
        self.deps.bus.emit(action);
        self.settle(pending).await
    }

    async fn settle(&self, pending: Pending) -> Result<Arc<Event>, FlowError> {
        let event = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(FlowError::Canceled),
            ev = pending => ev.ok_or(FlowError::Canceled)?,
        };
        self.ensure_active()?;
        Ok(event)
    }

    /// Runs a request through the executor.
    pub async fn call(&self, request: Request) -> Result<ApiResult, FlowError> {
        self.ensure_active()?;
        trace!(
            worker = %self.worker,
            method = request.endpoint.method.as_str(),
            url = %request.endpoint.url,
            "calling executor"
        );
        let result = self.deps.executor.execute(request).await;
        self.ensure_active()?;
        Ok(result)
    }

    /// Suspends this worker only.
    pub async fn delay(&self, duration: Duration) -> Result<(), FlowError> {
        self.ensure_active()?;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(FlowError::Canceled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Writes a JSON value to durable storage.
    pub fn persist(&self, key: &str, value: Value) -> Result<(), FlowError> {
        self.ensure_active()?;
        self.deps.storage.set(key, value)?;
        Ok(())
    }

    /// Writes several keys as one step.
    ///
    /// Cancellation is checked once, up front. If a write fails, the keys
    /// already written get their previous values back and the first error
    /// is returned.
    pub fn persist_all(&self, entries: &[(&str, Value)]) -> Result<(), FlowError> {
        self.ensure_active()?;
        let storage = &self.deps.storage;
        let mut written: Vec<(&str, Value)> = Vec::with_capacity(entries.len());
        for &(key, ref value) in entries {
            let previous = storage.get(key).ok().flatten().unwrap_or(Value::Null);
            if let Err(err) = storage.set(key, value.clone()) {
                for (key, previous) in written.into_iter().rev() {
                    if let Err(rollback) = storage.set(key, previous) {
                        warn!(worker = %self.worker, key, error = %rollback, "rollback failed");
                    }
                }
                return Err(err.into());
            }
            written.push((key, previous));
        }
        Ok(())
    }

    /// Read-only session view.
    pub fn session(&self) -> &dyn SessionStore {
        &*self.deps.store
    }

    /// Runs `f` against the current application state.
    pub fn select<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        self.deps.store.select(f)
    }
}
