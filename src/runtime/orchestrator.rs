//! # Orchestrator: owns the bus, the store and the watchers.
//!
//! The [`Orchestrator`] is the embedding application's handle on the
//! workflow runtime. It is built once (see
//! [`OrchestratorBuilder`](super::OrchestratorBuilder)), inside a Tokio
//! runtime, and lives as long as the application.
//!
//! ## Architecture
//! ```text
//!   app ── login_user / pop_toast / emit ──► Bus
//!                                             ├─► Store (reducer)
//!                                             ├─► Watcher ×6 ──► spawn worker (TaskTracker)
//!                                             │                     └─► Effects: put/take/call/delay/persist
//!                                             ├─► waiters (take / put_and_take)
//!                                             └─► tap ──► listener ──► SubscriberSet ──► observers
//! ```
//!
//! ## Shutdown
//! ```text
//! shutdown()
//!   ├─► runtime_token.cancel()     → every worker token (child) is cancelled
//!   ├─► tracker.close()
//!   ├─► timeout(grace, tracker.wait())
//!   │      ├─ Ok  → Ok(())
//!   │      └─ Err → RuntimeError::GraceExceeded { running }
//!   └─► stop listener (drains queued events to observers first)
//! ```
//!
//! After shutdown `emit` still applies the reducer and reaches observers,
//! but watchers no longer spawn workers.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Action, Bus, Credentials, Event, RegistrationDetails, ToastRequest};
use crate::io::RequestExecutor;
use crate::store::Store;

use super::builder::OrchestratorBuilder;
use super::watcher::Watcher;

/// Handle on a running workflow runtime.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    store: Arc<Store>,
    watchers: Vec<Arc<Watcher>>,
    tracker: TaskTracker,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Starts building an orchestrator around `executor`.
    pub fn builder(cfg: Config, executor: Arc<dyn RequestExecutor>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg, executor)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        store: Arc<Store>,
        watchers: Vec<Arc<Watcher>>,
        tracker: TaskTracker,
        runtime_token: CancellationToken,
        listener_token: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cfg,
            bus,
            store,
            watchers,
            tracker,
            runtime_token,
            listener_token,
            listener: Mutex::new(listener),
        }
    }

    /// Emits an action from outside any workflow.
    ///
    /// When this returns, the store has applied the event and any watcher
    /// bound to its kind has dispatched its worker.
    pub fn emit(&self, action: Action) -> Arc<Event> {
        self.bus.emit(action)
    }

    pub fn login_user(
        &self,
        email_address: impl Into<String>,
        password: impl Into<String>,
    ) -> Arc<Event> {
        self.emit(Action::LoginUser(Credentials::new(email_address, password)))
    }

    pub fn logout_user(&self) -> Arc<Event> {
        self.emit(Action::LogoutUser)
    }

    pub fn register_user(&self, details: RegistrationDetails) -> Arc<Event> {
        self.emit(Action::RegisterUser(details))
    }

    pub fn request_token(
        &self,
        email_address: impl Into<String>,
        password: impl Into<String>,
    ) -> Arc<Event> {
        self.emit(Action::RequestToken(Credentials::new(email_address, password)))
    }

    pub fn request_current_user(&self) -> Arc<Event> {
        self.emit(Action::RequestCurrentUser)
    }

    pub fn pop_toast(&self, request: ToastRequest) -> Arc<Event> {
        self.emit(Action::PopToast(request))
    }

    /// Raw event tap. Lagging receivers skip events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.bus.subscribe()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn watchers(&self) -> &[Arc<Watcher>] {
        &self.watchers
    }

    /// Number of worker runs still in flight.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.runtime_token.is_cancelled()
    }

    /// Cancels every worker and waits up to [`Config::grace`] for them to exit.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!(running = self.tracker.len(), "shutdown requested");
        self.runtime_token.cancel();
        self.tracker.close();

        let grace = self.cfg.grace;
        let result = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("all workers stopped within grace");
                Ok(())
            }
            Err(_) => {
                let running = self.tracker.len();
                warn!(?grace, running, "grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, running })
            }
        };

        self.listener_token.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        result
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.listener_token.cancel();
        // Watchers hold the bus through their dependencies.
        self.bus.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::FlowError;
    use crate::events::EventKind;
    use crate::runtime::{Effects, WatcherSpec};
    use crate::testing::{MockExecutor, collect_until};
    use crate::workers::{WorkerFn, WorkerRef};

    fn slow_logout(started: Arc<AtomicUsize>) -> WorkerRef {
        WorkerFn::arc("slow-logout", move |_ev: Arc<Event>, fx: Effects| {
            let started = Arc::clone(&started);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                fx.delay(Duration::from_millis(100)).await?;
                fx.put(Action::LogoutUserSuccess)?;
                Ok::<_, FlowError>(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn latest_wins_leaves_one_terminal_outcome() {
        let started = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(Config::default(), MockExecutor::new().arc())
            .with_watchers(vec![WatcherSpec::latest_wins(
                "logout",
                EventKind::LogoutUser,
                slow_logout(started.clone()),
            )])
            .build()
            .unwrap();
        let mut rx = orch.subscribe();

        orch.logout_user();
        let second = orch.logout_user();

        let events = collect_until(&mut rx, Duration::from_secs(1), |_| false).await;
        let outcomes = events
            .iter()
            .filter(|e| e.is(EventKind::LogoutUserSuccess))
            .count();
        assert_eq!(outcomes, 1);
        assert_eq!(orch.watchers()[0].dispatched(), 2);
        assert_eq!(orch.watchers()[0].current_trigger(), None);
        assert!(second.seq > 0);
        assert_eq!(orch.running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_all_keeps_every_worker() {
        let started = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(Config::default(), MockExecutor::new().arc())
            .with_watchers(vec![WatcherSpec::run_all(
                "logout",
                EventKind::LogoutUser,
                slow_logout(started.clone()),
            )])
            .build()
            .unwrap();
        let mut rx = orch.subscribe();

        orch.logout_user();
        orch.logout_user();

        let events = collect_until(&mut rx, Duration::from_secs(1), |_| false).await;
        let outcomes = events
            .iter()
            .filter(|e| e.is(EventKind::LogoutUserSuccess))
            .count();
        assert_eq!(outcomes, 2);
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_waiting_workers() {
        let orch = Orchestrator::builder(Config::default(), MockExecutor::new().arc())
            .with_watchers(vec![WatcherSpec::run_all(
                "stuck",
                EventKind::LogoutUser,
                WorkerFn::arc("stuck", |_ev: Arc<Event>, fx: Effects| async move {
                    fx.take(&[EventKind::LogoutUserSuccess]).await?;
                    Ok::<_, FlowError>(())
                }),
            )])
            .build()
            .unwrap();

        orch.logout_user();
        tokio::task::yield_now().await;
        assert_eq!(orch.running(), 1);

        orch.shutdown().await.unwrap();
        assert!(orch.is_shutting_down());
        assert_eq!(orch.running(), 0);

        orch.logout_user();
        assert_eq!(orch.watchers()[0].dispatched(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_reports_workers_past_grace() {
        let cfg = Config {
            grace: Duration::from_millis(50),
            ..Config::default()
        };
        let blocker = MockExecutor::new().with_delay(Duration::from_secs(10));
        let orch = Orchestrator::builder(cfg, blocker.arc())
            .build()
            .unwrap();

        orch.request_current_user();
        tokio::task::yield_now().await;

        let err = orch.shutdown().await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        match err {
            RuntimeError::GraceExceeded { running, .. } => assert_eq!(running, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_worker_does_not_stop_its_watcher() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let orch = Orchestrator::builder(Config::default(), MockExecutor::new().arc())
            .with_watchers(vec![WatcherSpec::run_all(
                "flaky",
                EventKind::LogoutUser,
                WorkerFn::arc("flaky", move |_ev: Arc<Event>, fx: Effects| {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            panic!("first run explodes");
                        }
                        fx.put(Action::LogoutUserSuccess)?;
                        Ok::<_, FlowError>(())
                    }
                }),
            )])
            .build()
            .unwrap();
        let mut rx = orch.subscribe();

        orch.logout_user();
        orch.logout_user();
        let events = collect_until(&mut rx, Duration::from_secs(1), |e| {
            e.is(EventKind::LogoutUserSuccess)
        })
        .await;

        assert!(events.last().is_some_and(|e| e.is(EventKind::LogoutUserSuccess)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait::async_trait]
    impl crate::subscribers::Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().push(event.kind());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn observers_see_everything_before_shutdown_returns() {
        let recorder = Arc::new(Recorder::default());
        let orch = Orchestrator::builder(Config::default(), MockExecutor::new().arc())
            .with_subscribers(vec![recorder.clone() as Arc<dyn crate::subscribers::Subscribe>])
            .build()
            .unwrap();

        orch.pop_toast(ToastRequest::success("a", "b"));
        tokio::time::sleep(Duration::from_secs(6)).await;
        orch.shutdown().await.unwrap();

        assert_eq!(
            *recorder.0.lock(),
            vec![
                EventKind::PopToast,
                EventKind::AddToast,
                EventKind::HideToast,
                EventKind::RemoveToast,
            ]
        );
    }

    #[test]
    fn build_requires_a_runtime() {
        let res = Orchestrator::builder(Config::default(), MockExecutor::new().arc()).build();
        assert!(matches!(res, Err(RuntimeError::NoRuntime)));
    }
}
