//! # SubscriberSet: non-blocking fan-out over multiple observers
//!
//! [`SubscriberSet`] hands every [`Event`] to each subscriber **without
//! awaiting** its processing.
//!
//! ## Guarantees
//! - `emit(&Arc<Event>)` returns immediately.
//! - Per-subscriber FIFO (bus `seq` order).
//! - Panics inside subscribers are caught and logged.
//!
//! ## Non-guarantees
//! - No ordering across different subscribers.
//! - No retries on queue overflow (the event is dropped for that subscriber).
//!
//! ```text
//!    emit(&Arc<Event>)
//!        ├──► [queue S1] ─► task S1 ─► on_event()
//!        ├──► [queue S2] ─► task S2 ─► on_event()
//!        └──► [queue SN] ─► task SN ─► on_event()
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::events::Event;

use super::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out with per-subscriber bounded queues and tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    tasks: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates the set and spawns one task per subscriber on `handle`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, handle: &Handle) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut tasks = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            tasks.push(handle.spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind();
                    if fut.await.is_err() {
                        error!(subscriber = sub.name(), seq = ev.seq, "subscriber panicked");
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self { channels, tasks }
    }

    /// Hands one event to every subscriber.
    pub fn emit(&self, event: &Arc<Event>) {
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, seq = event.seq, "event dropped: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, seq = event.seq, "event dropped: subscriber closed");
                }
            }
        }
    }

    /// Closes all queues and waits for the subscribers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for task in self.tasks {
            let _ = task.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::events::{Action, Bus, EventKind};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().push(event.kind());
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploding;

    #[async_trait]
    impl Subscribe for Exploding {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let bus = Bus::new(8);
        let rec = Arc::new(Recorder::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Exploding), rec.clone() as Arc<dyn Subscribe>];
        let set = SubscriberSet::new(subs, &Handle::current());
        assert_eq!(set.len(), 2);

        set.emit(&bus.emit(Action::LogoutUser));
        set.emit(&bus.emit(Action::LogoutUserSuccess));
        set.shutdown().await;

        assert_eq!(
            *rec.0.lock(),
            vec![EventKind::LogoutUser, EventKind::LogoutUserSuccess]
        );
    }

    #[tokio::test]
    async fn empty_set_accepts_events() {
        let bus = Bus::new(1);
        let set = SubscriberSet::new(Vec::new(), &Handle::current());
        assert!(set.is_empty());
        set.emit(&bus.emit(Action::LogoutUser));
        set.shutdown().await;
    }
}
