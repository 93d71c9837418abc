//! # Function-backed worker (`WorkerFn`)
//!
//! [`WorkerFn`] wraps a closure `F: Fn(Arc<Event>, Effects) -> Fut`, producing
//! a fresh future per trigger. No state is shared between runs unless the
//! closure captures an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flowvisor::{Action, Effects, Event, FlowError, WorkerFn, WorkerRef};
//!
//! let w: WorkerRef = WorkerFn::arc("ack", |_ev: Arc<Event>, fx: Effects| async move {
//!     fx.put(Action::LogoutUserSuccess)?;
//!     Ok::<_, FlowError>(())
//! });
//!
//! assert_eq!(w.name(), "ack");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::events::Event;
use crate::runtime::Effects;

use super::worker::Worker;

/// Function-backed worker implementation.
pub struct WorkerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkerFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the worker and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(Arc<Event>, Effects) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FlowError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        (self.f)(trigger, fx).await
    }
}
