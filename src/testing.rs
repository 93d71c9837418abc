//! Shared test harness: scripted executor, event collection and a ready-made orchestrator.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::events::{Event, EventKind};
use crate::io::{ApiResult, MemoryStorage, Request, RequestExecutor, Storage};
use crate::runtime::Orchestrator;

/// Executor answering from per-url scripts.
///
/// Each url has a queue of results; the last one repeats. Unscripted urls
/// get an unspecified result.
#[derive(Default)]
pub(crate) struct MockExecutor {
    scripts: Mutex<HashMap<String, VecDeque<ApiResult>>>,
    calls: Mutex<Vec<Request>>,
    delay: Option<Duration>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, url: &str, result: ApiResult) -> Self {
        self.scripts
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Every call sleeps `delay` before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.endpoint.url == url)
            .count()
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(&self, request: Request) -> ApiResult {
        let url = request.endpoint.url.clone();
        self.calls.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(&url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => ApiResult::unspecified(),
        }
    }
}

/// Successful credential exchange payload.
pub(crate) fn bearer_grant(token: &str, expires_in: i64) -> ApiResult {
    ApiResult::ok(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in,
    }))
}

/// Collects events until `done` returns true for one (included) or `within` elapses.
pub(crate) async fn collect_until(
    rx: &mut broadcast::Receiver<Arc<Event>>,
    within: Duration,
    mut done: impl FnMut(&Event) -> bool,
) -> Vec<Arc<Event>> {
    let mut out = Vec::new();
    let _ = tokio::time::timeout(within, async {
        while let Ok(ev) = rx.recv().await {
            let stop = done(&ev);
            out.push(ev);
            if stop {
                break;
            }
        }
    })
    .await;
    out
}

pub(crate) fn kinds(events: &[Arc<Event>]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind()).collect()
}

/// Orchestrator with the built-in watchers over `executor` and `storage`.
pub(crate) struct Harness {
    pub(crate) orch: Arc<Orchestrator>,
    pub(crate) rx: broadcast::Receiver<Arc<Event>>,
    pub(crate) executor: Arc<MockExecutor>,
    pub(crate) storage: Arc<MemoryStorage>,
}

impl Harness {
    pub(crate) fn new(executor: MockExecutor) -> Self {
        Self::with_storage(executor, MemoryStorage::new())
    }

    pub(crate) fn with_storage(executor: MockExecutor, storage: MemoryStorage) -> Self {
        let executor = executor.arc();
        let storage = Arc::new(storage);
        let orch = Orchestrator::builder(Config::default(), executor.clone())
            .with_storage(storage.clone())
            .build()
            .expect("inside a runtime");
        let rx = orch.subscribe();
        Self {
            orch,
            rx,
            executor,
            storage,
        }
    }

    /// Collects events until the first one of `kind` (or 10s of test time).
    pub(crate) async fn until(&mut self, kind: EventKind) -> Vec<Arc<Event>> {
        collect_until(&mut self.rx, Duration::from_secs(10), |e| e.is(kind)).await
    }

    /// Collects everything emitted in the next `within`.
    pub(crate) async fn drain(&mut self, within: Duration) -> Vec<Arc<Event>> {
        collect_until(&mut self.rx, within, |_| false).await
    }

    pub(crate) fn stored(&self, key: &str) -> Option<serde_json::Value> {
        self.storage.get(key).ok().flatten()
    }
}
