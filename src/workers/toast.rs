//! # Toast lifecycle worker.
//!
//! ```text
//! PopToast{request}
//!   ├─► AddToast{toast}      id resolved, visible = true
//!   ├─  delay interval       (request interval, else Config::toast_interval)
//!   ├─► HideToast{id}
//!   ├─  delay fade           (Config::toast_fade)
//!   └─► RemoveToast{id}
//! ```
//!
//! Runs under `RunAll`: each toast has its own timeline. Only orchestrator
//! shutdown interrupts it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::events::{Action, Event, Toast};
use crate::runtime::Effects;

use super::Worker;

/// Drives one toast from add to remove.
pub struct ToastWorker;

#[async_trait]
impl Worker for ToastWorker {
    fn name(&self) -> &str {
        "toast"
    }

    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        let Action::PopToast(request) = &trigger.action else {
            return Ok(());
        };
        let toast = Toast::from_request(request.clone(), fx.config().toast_interval());
        let id = toast.id.clone();
        let interval = toast.interval;

        fx.put(Action::AddToast(toast))?;
        fx.delay(interval).await?;
        fx.put(Action::HideToast { id: id.clone() })?;
        fx.delay(fx.config().toast_fade).await?;
        fx.put(Action::RemoveToast { id })?;
        Ok(())
    }
}
