//! # Workers: bounded workflows started by watchers.
//!
//! | Watcher | Trigger | Policy | Worker |
//! |---------|---------|--------|--------|
//! | `login` | `LoginUser` | latest-wins | [`LoginWorker`] |
//! | `logout` | `LogoutUser` | latest-wins | [`LogoutWorker`] |
//! | `register` | `RegisterUser` | latest-wins | [`RegisterWorker`] |
//! | `request-token` | `RequestToken` | latest-wins | [`RequestTokenWorker`] |
//! | `request-current-user` | `RequestCurrentUser` | latest-wins | [`RequestCurrentUserWorker`] |
//! | `toast` | `PopToast` | run-all | [`ToastWorker`] |
//!
//! Every session worker ends with exactly one success or failure event
//! unless it is superseded. A failure is always followed by an error toast.

mod current_user;
mod login;
mod logout;
mod register;
mod toast;
mod token;
mod worker;
mod worker_fn;

use std::sync::Arc;

use crate::error::FlowError;
use crate::events::{Action, EventKind, ToastRequest};
use crate::runtime::{Effects, WatcherSpec};

pub use current_user::RequestCurrentUserWorker;
pub use login::LoginWorker;
pub use logout::LogoutWorker;
pub use register::RegisterWorker;
pub use toast::ToastWorker;
pub use token::RequestTokenWorker;
pub use worker::{Worker, WorkerRef};
pub use worker_fn::WorkerFn;

/// The built-in watchers, in registration order.
pub fn default_watchers() -> Vec<WatcherSpec> {
    vec![
        WatcherSpec::latest_wins("login", EventKind::LoginUser, Arc::new(LoginWorker)),
        WatcherSpec::latest_wins("logout", EventKind::LogoutUser, Arc::new(LogoutWorker)),
        WatcherSpec::latest_wins("register", EventKind::RegisterUser, Arc::new(RegisterWorker)),
        WatcherSpec::latest_wins(
            "request-token",
            EventKind::RequestToken,
            Arc::new(RequestTokenWorker),
        ),
        WatcherSpec::latest_wins(
            "request-current-user",
            EventKind::RequestCurrentUser,
            Arc::new(RequestCurrentUserWorker),
        ),
        WatcherSpec::run_all("toast", EventKind::PopToast, Arc::new(ToastWorker)),
    ]
}

/// Emits a failure outcome, then an error toast carrying its message.
pub(crate) fn report_failure(fx: &Effects, outcome: Action, title: &str) -> Result<(), FlowError> {
    let message = outcome.error().map(FlowError::message).unwrap_or_default();
    fx.put(outcome)?;
    fx.put(Action::PopToast(ToastRequest::error(title, message)))?;
    Ok(())
}
