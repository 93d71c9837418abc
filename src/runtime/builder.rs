use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Event};
use crate::io::{MemoryStorage, RequestExecutor, Storage};
use crate::store::Store;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::workers::default_watchers;

use super::effects::Deps;
use super::orchestrator::Orchestrator;
use super::watcher::{Watcher, WatcherSpec};

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    cfg: Config,
    executor: Arc<dyn RequestExecutor>,
    storage: Option<Arc<dyn Storage>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    watchers: Option<Vec<WatcherSpec>>,
}

impl OrchestratorBuilder {
    pub fn new(cfg: Config, executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            cfg,
            executor,
            storage: None,
            subscribers: Vec::new(),
            watchers: None,
        }
    }

    /// Sets durable storage (default: in-memory).
    ///
    /// The session token is restored from it when the orchestrator is built.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets observers of the event stream.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the built-in session and toast watchers.
    pub fn with_watchers(mut self, watchers: Vec<WatcherSpec>) -> Self {
        self.watchers = Some(watchers);
        self
    }

    /// Builds the orchestrator and registers its watchers.
    ///
    /// Must be called from within a Tokio runtime; workers and observers are
    /// spawned on that runtime, whichever thread later emits.
    pub fn build(self) -> Result<Arc<Orchestrator>, RuntimeError> {
        let handle = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let store = Arc::new(Store::hydrate(storage.as_ref()));

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        bus.register_reducer(store.clone());

        let deps = Arc::new(Deps {
            config: self.cfg.clone(),
            bus: bus.clone(),
            store: Arc::clone(&store),
            executor: self.executor,
            storage,
        });

        let runtime_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let specs = self.watchers.unwrap_or_else(default_watchers);
        let mut watchers = Vec::with_capacity(specs.len());
        for spec in specs {
            debug!(
                watcher = spec.name(),
                trigger = %spec.trigger(),
                policy = spec.policy().as_str(),
                "watcher registered"
            );
            let watcher = Arc::new(Watcher::new(
                spec,
                Arc::clone(&deps),
                runtime_token.clone(),
                tracker.clone(),
                handle.clone(),
            ));
            bus.register_watcher(watcher.clone());
            watchers.push(watcher);
        }

        let listener_token = CancellationToken::new();
        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, &handle);
            subscriber_listener(bus.subscribe(), set, listener_token.clone(), &handle)
        });

        Ok(Arc::new(Orchestrator::new_internal(
            self.cfg,
            bus,
            store,
            watchers,
            tracker,
            runtime_token,
            listener_token,
            listener,
        )))
    }
}

/// Forwards the bus tap to the subscriber set until `stop`; queued events are drained first.
fn subscriber_listener(
    mut rx: broadcast::Receiver<Arc<Event>>,
    set: SubscriberSet,
    stop: CancellationToken,
    handle: &Handle,
) -> JoinHandle<()> {
    handle.spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "observers lagging; events skipped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        set.shutdown().await;
    })
}
