//! # Register worker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::events::{Action, Event, RegistrationDetails, ToastRequest};
use crate::io::Request;
use crate::runtime::Effects;

use super::{Worker, report_failure};

const UNSPECIFIED: &str = "Registration failed for an unspecified reason!";

/// Submits a registration; success asks the user to check their email.
pub struct RegisterWorker;

impl RegisterWorker {
    async fn register(&self, details: &RegistrationDetails, fx: &Effects) -> Result<(), FlowError> {
        let body = serde_json::to_value(details).map_err(|e| FlowError::protocol(e.to_string()))?;
        let request = Request::post(fx.config().endpoints.register.clone(), body);
        fx.call(request).await?.into_data(UNSPECIFIED)?;
        Ok(())
    }
}

#[async_trait]
impl Worker for RegisterWorker {
    fn name(&self) -> &str {
        "register"
    }

    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        let Action::RegisterUser(details) = &trigger.action else {
            return Ok(());
        };
        match self.register(details, &fx).await {
            Ok(()) => {
                fx.put(Action::RegisterUserSuccess)?;
                fx.put(Action::PopToast(ToastRequest::success(
                    "Success!",
                    "Check your email for an activation link.",
                )))?;
                Ok(())
            }
            Err(FlowError::Canceled) => Err(FlowError::Canceled),
            Err(error) => report_failure(&fx, Action::RegisterUserFailure { error }, "Error"),
        }
    }
}
