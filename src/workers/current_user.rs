//! # Request-current-user worker.
//!
//! `GET /user/current`; a null payload is a success without a user.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::events::{Action, Event, User};
use crate::io::Request;
use crate::runtime::Effects;

use super::{Worker, report_failure};

const UNSPECIFIED: &str = "Failed to get current user!";

/// Fetches the identity of the authenticated user.
pub struct RequestCurrentUserWorker;

#[async_trait]
impl Worker for RequestCurrentUserWorker {
    fn name(&self) -> &str {
        "request-current-user"
    }

    async fn run(&self, _trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        let request = Request::get(fx.config().endpoints.current_user.clone());
        let outcome = fx.call(request).await?.into_data(UNSPECIFIED);
        match outcome {
            Ok(data) => {
                fx.put(Action::RequestCurrentUserSuccess {
                    user: User::from_value(data),
                })?;
                Ok(())
            }
            Err(error) => {
                report_failure(&fx, Action::RequestCurrentUserFailure { error }, "Error")
            }
        }
    }
}
