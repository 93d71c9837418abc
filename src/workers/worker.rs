//! # Worker abstraction.
//!
//! A [`Worker`] is one bounded workflow. The watcher hands it the triggering
//! event and an [`Effects`] handle, and the worker performs its steps through
//! that handle only, so cancellation is observed at every suspension point.
//!
//! The common handle type is [`WorkerRef`], an `Arc<dyn Worker>` shared by
//! every run the watcher spawns.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::events::Event;
use crate::runtime::Effects;

/// # Asynchronous, cancellable workflow.
///
/// Implementations catch their own failures and report them as failure
/// events; the only error they should let out is [`FlowError::Canceled`],
/// which the runner treats as a silent exit.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use flowvisor::{Action, Effects, Event, FlowError, Worker};
///
/// struct Ack;
///
/// #[async_trait]
/// impl Worker for Ack {
///     fn name(&self) -> &str { "ack" }
///
///     async fn run(&self, _trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
///         fx.put(Action::LogoutUserSuccess)?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Stable, human-readable worker name (used in logs).
    fn name(&self) -> &str;

    /// Runs the workflow for one trigger event.
    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError>;
}

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;
