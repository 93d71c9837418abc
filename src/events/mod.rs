//! Events: data model and dispatch bus.
//!
//! ## Contents
//! - [`Action`], [`EventKind`], [`Event`] the closed event catalogue
//! - [`payload`] types carried by events (credentials, token, user, toast)
//! - [`Bus`] synchronous dispatch to reducers, watchers, waiters and observers
//!
//! ## Quick reference
//! - **Publishers**: the orchestrator (external triggers) and workers.
//! - **Consumers**: the application store (reducer), watchers, workers
//!   suspended in await-any, and observers via [`Bus::subscribe`].

mod bus;
mod event;
pub mod payload;

pub use bus::{Bus, Dispatch, Pending, Reduce};
pub use event::{Action, Event, EventKind};
pub use payload::{
    Credentials, ICON_CHECK, ICON_ERROR, RegistrationDetails, Toast, ToastId, ToastRequest, Token,
    User,
};
