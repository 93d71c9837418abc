//! # Logout worker.
//!
//! Clears the persisted token when a session is active, confirms with a
//! toast and emits `LogoutUserSuccess`; the store drops token and user when
//! it applies that event.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FlowError;
use crate::events::{Action, Event, ToastRequest};
use crate::io::{ACCESS_TOKEN_KEY, EXPIRATION_KEY};
use crate::runtime::Effects;

use super::{Worker, report_failure};

/// Ends the current session.
pub struct LogoutWorker;

impl LogoutWorker {
    fn logout(&self, fx: &Effects) -> Result<(), FlowError> {
        if fx.session().is_logged_in() {
            fx.persist_all(&[
                (ACCESS_TOKEN_KEY, Value::Null),
                (EXPIRATION_KEY, Value::Null),
            ])?;
        }
        fx.put(Action::PopToast(ToastRequest::success(
            "Logged out",
            "You have been logged out.",
        )))?;
        Ok(())
    }
}

#[async_trait]
impl Worker for LogoutWorker {
    fn name(&self) -> &str {
        "logout"
    }

    async fn run(&self, _trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        match self.logout(&fx) {
            Ok(()) => {
                fx.put(Action::LogoutUserSuccess)?;
                Ok(())
            }
            Err(FlowError::Canceled) => Err(FlowError::Canceled),
            Err(error) => report_failure(&fx, Action::LogoutUserFailure { error }, "Error"),
        }
    }
}
