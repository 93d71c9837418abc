//! # LogWriter: event stream through `tracing`
//!
//! Writes every event as one structured record. Failures are logged at
//! `warn`, everything else at `info` (toast lifecycle at `debug`).
//!
//! ## Example output
//! ```text
//! INFO flowvisor: event seq=1 kind=LOGIN_USER email="some@one.org"
//! INFO flowvisor: event seq=4 kind=REQUEST_TOKEN_SUCCESS expires_at=2024-01-01T13:00:00.000Z
//! WARN flowvisor: event seq=7 kind=LOGIN_USER_FAILURE error=flow_aborted message=Failed to log in!
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Action, Event};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let kind = e.kind().as_str();
        match &e.action {
            Action::LoginUser(c) | Action::RequestToken(c) => {
                info!(seq = e.seq, kind, email = %c.email_address, "event");
            }
            Action::RegisterUser(d) => {
                info!(seq = e.seq, kind, email = %d.email_address, username = %d.username, "event");
            }
            Action::RequestTokenSuccess { token } => {
                info!(seq = e.seq, kind, expires_at = %token.expiration_iso(), "event");
            }
            Action::RequestCurrentUserSuccess { user } => {
                info!(seq = e.seq, kind, has_user = user.is_some(), "event");
            }
            Action::PopToast(req) => {
                debug!(seq = e.seq, kind, title = %req.title, "event");
            }
            Action::AddToast(t) => {
                debug!(seq = e.seq, kind, id = %t.id, title = %t.title, interval = ?t.interval, "event");
            }
            Action::HideToast { id } | Action::RemoveToast { id } => {
                debug!(seq = e.seq, kind, id = %id, "event");
            }
            action => match action.error() {
                Some(err) => {
                    warn!(seq = e.seq, kind, error = err.as_label(), message = %err, "event");
                }
                None => info!(seq = e.seq, kind, "event"),
            },
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
