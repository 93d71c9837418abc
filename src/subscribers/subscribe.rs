//! # Observer trait
//!
//! `Subscribe` is how the UI side (or any other consumer) watches the event
//! stream. Each subscriber is driven by its own task fed by a bounded queue
//! owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never hold up `emit`, the watchers or
//!   other subscribers.
//! - Each subscriber declares its queue size via
//!   [`Subscribe::queue_capacity`]. On overflow the event is **dropped** for
//!   that subscriber only (warn).
//! - Subscribers cannot influence workflows; they only observe.
//!
//! ## Example
//! ```rust
//! use flowvisor::{Event, EventKind, Subscribe};
//!
//! struct ToastView;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for ToastView {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.is(EventKind::AddToast) {
//!             // render it...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "toast-view" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event observers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle one emitted event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
