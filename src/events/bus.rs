//! # Event bus: the single dispatch point of the orchestrator.
//!
//! Every [`Bus::emit`] runs the full delivery synchronously, under one lock:
//!
//! ```text
//! emit(action)
//!   │  seq += 1
//!   ├─► reducers      (application store, in registration order)
//!   ├─► watchers      (trigger kind matches, in registration order)
//!   ├─► one waiter    (first registered whose kind set matches)
//!   └─► observer tap  (broadcast, fire-and-forget)
//! ```
//!
//! ## Rules
//! - **Synchronous delivery**: when `emit` returns, reducers have applied the
//!   event and matching watchers have dispatched their workers.
//! - **One waiter per emission**: a waiter is woken at most once and removed;
//!   other waiters on the same kind stay suspended.
//! - **No persistence**: an event with no current listener is dropped.
//! - **No re-entrancy**: reducers and watchers must not emit from inside
//!   their callbacks; workers emit from their own tasks.
//! - **Lagging observers** on the tap get `RecvError::Lagged(n)` and skip `n`
//!   events. Watchers and waiters never lag.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::event::{Action, Event, EventKind};

/// State folded from events, applied before any watcher sees the event.
pub trait Reduce: Send + Sync + 'static {
    fn reduce(&self, event: &Event);
}

/// Synchronous receiver of trigger events.
pub trait Dispatch: Send + Sync + 'static {
    /// Kind this dispatcher is bound to.
    fn trigger(&self) -> EventKind;

    /// Called under the bus lock; must not block or emit.
    fn dispatch(&self, event: &Arc<Event>);
}

struct Waiter {
    id: u64,
    kinds: Vec<EventKind>,
    tx: oneshot::Sender<Arc<Event>>,
    cancel: Option<CancellationToken>,
}

impl Waiter {
    /// Dropped receiver, or the owning worker was cancelled but not yet polled.
    fn is_dead(&self) -> bool {
        self.tx.is_closed() || self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

#[derive(Default)]
struct Routes {
    seq: u64,
    next_waiter: u64,
    reducers: Vec<Arc<dyn Reduce>>,
    watchers: Vec<Arc<dyn Dispatch>>,
    waiters: VecDeque<Waiter>,
}

impl Routes {
    /// Wakes the first live waiter interested in `event`; dead ones are pruned on the way.
    fn wake_one(&mut self, event: &Arc<Event>) -> bool {
        let kind = event.kind();
        let mut i = 0;
        while i < self.waiters.len() {
            if self.waiters[i].is_dead() {
                let _ = self.waiters.remove(i);
                continue;
            }
            if !self.waiters[i].kinds.contains(&kind) {
                i += 1;
                continue;
            }
            if let Some(waiter) = self.waiters.remove(i) {
                if waiter.tx.send(Arc::clone(event)).is_ok() {
                    return true;
                }
            }
        }
        false
    }
}

struct Inner {
    routes: Mutex<Routes>,
    tap: broadcast::Sender<Arc<Event>>,
}

/// Dispatch point for all events.
///
/// ### Properties
/// - **Cloneable**: cheap to clone (internally an `Arc`).
/// - **Ordered**: `seq` is assigned under the dispatch lock.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// Creates a new bus; `capacity` bounds the observer tap only (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tap, _rx) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                routes: Mutex::new(Routes::default()),
                tap,
            }),
        }
    }

    /// Registers a reducer; it sees every subsequent event.
    pub fn register_reducer(&self, reducer: Arc<dyn Reduce>) {
        self.inner.routes.lock().reducers.push(reducer);
    }

    /// Registers a watcher; it sees subsequent events of its trigger kind.
    pub fn register_watcher(&self, watcher: Arc<dyn Dispatch>) {
        self.inner.routes.lock().watchers.push(watcher);
    }

    /// Emits an action and delivers it to every current listener.
    ///
    /// Returns the event as it was delivered.
    pub fn emit(&self, action: Action) -> Arc<Event> {
        let mut routes = self.inner.routes.lock();
        routes.seq += 1;
        let event = Arc::new(Event::new(routes.seq, action));
        let kind = event.kind();

        for reducer in &routes.reducers {
            reducer.reduce(&event);
        }
        for watcher in routes.watchers.iter().filter(|w| w.trigger() == kind) {
            watcher.dispatch(&event);
        }
        let woke = routes.wake_one(&event);
        let _ = self.inner.tap.send(Arc::clone(&event));
        drop(routes);

        trace!(seq = event.seq, kind = %kind, woke, "event emitted");
        event
    }

    /// Registers a waiter for the first of `kinds` emitted from now on.
    ///
    /// Registration happens immediately, before the returned future is
    /// polled, so an emission right after this call is never missed.
    /// Dropping the [`Pending`] deregisters it.
    pub fn wait_for(&self, kinds: &[EventKind]) -> Pending {
        self.register_waiter(kinds, None)
    }

    /// Like [`Bus::wait_for`], but the waiter is skipped once `cancel` fires,
    /// even while its [`Pending`] is still alive.
    pub fn wait_for_until(&self, kinds: &[EventKind], cancel: &CancellationToken) -> Pending {
        self.register_waiter(kinds, Some(cancel.clone()))
    }

    fn register_waiter(&self, kinds: &[EventKind], cancel: Option<CancellationToken>) -> Pending {
        let (tx, rx) = oneshot::channel();
        let mut routes = self.inner.routes.lock();
        routes.next_waiter += 1;
        let id = routes.next_waiter;
        routes.waiters.push_back(Waiter {
            id,
            kinds: kinds.to_vec(),
            tx,
            cancel,
        });
        Pending {
            id,
            rx,
            bus: self.clone(),
            done: false,
        }
    }

    /// Creates a new observer receiver for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.inner.tap.subscribe()
    }

    /// Number of registered waiters (including ones not yet pruned).
    pub fn waiting(&self) -> usize {
        self.inner.routes.lock().waiters.len()
    }

    /// Drops every reducer, watcher and waiter; the tap stays open.
    pub(crate) fn clear(&self) {
        let mut routes = self.inner.routes.lock();
        routes.reducers.clear();
        routes.watchers.clear();
        routes.waiters.clear();
    }

    fn deregister(&self, id: u64) {
        self.inner.routes.lock().waiters.retain(|w| w.id != id);
    }
}

/// A registered await-any wait.
///
/// Resolves to the matching event, or `None` if the bus went away.
pub struct Pending {
    id: u64,
    rx: oneshot::Receiver<Arc<Event>>,
    bus: Bus,
    done: bool,
}

impl Future for Pending {
    type Output = Option<Arc<Event>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(res) => {
                self.done = true;
                Poll::Ready(res.ok())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if !self.done {
            self.bus.deregister(self.id);
        }
    }
}
