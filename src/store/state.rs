//! Application state and the reducer that folds events into it.

use crate::events::{Action, Toast, Token, User};

/// Authentication part of the state.
///
/// `token` and `user` are each replaced whole, never field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<Token>,
    pub user: Option<User>,
}

/// Everything the orchestrator's reducer owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: SessionState,
    /// Toasts currently added, in insertion order.
    pub toasts: Vec<Toast>,
}

impl AppState {
    /// Applies one action.
    ///
    /// - `RequestTokenSuccess` stores the token
    /// - `RequestCurrentUserSuccess` stores the user (if the payload has one)
    /// - `LogoutUserSuccess` clears token and user
    /// - `AddToast` / `HideToast` / `RemoveToast` maintain the toast list
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::RequestTokenSuccess { token } => {
                self.session.token = Some(token.clone());
            }
            Action::RequestCurrentUserSuccess { user: Some(user) } => {
                self.session.user = Some(user.clone());
            }
            Action::LogoutUserSuccess => {
                self.session = SessionState::default();
            }
            Action::AddToast(toast) => {
                self.toasts.retain(|t| t.id != toast.id);
                self.toasts.push(toast.clone());
            }
            Action::HideToast { id } => {
                if let Some(t) = self.toasts.iter_mut().find(|t| &t.id == id) {
                    t.visible = false;
                }
            }
            Action::RemoveToast { id } => {
                self.toasts.retain(|t| &t.id != id);
            }
            _ => {}
        }
    }

    pub fn toast(&self, id: &crate::events::ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| &t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::error::FlowError;
    use crate::events::{ToastId, ToastRequest};

    fn toast(id: &str) -> Toast {
        Toast::from_request(
            ToastRequest::success("Success!", "done").with_id(id),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn token_success_sets_whole_token() {
        let mut state = AppState::default();
        let token = Token::new("abc", Utc::now());
        state.apply(&Action::RequestTokenSuccess {
            token: token.clone(),
        });
        assert_eq!(state.session.token, Some(token));
    }

    #[test]
    fn token_failure_leaves_session_untouched() {
        let mut state = AppState::default();
        state.apply(&Action::RequestTokenFailure {
            error: FlowError::external("invalid_grant"),
        });
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn empty_user_payload_is_ignored() {
        let mut state = AppState::default();
        state.apply(&Action::RequestCurrentUserSuccess { user: None });
        assert!(state.session.user.is_none());

        let user = User::from_value(json!({"id": 1})).unwrap();
        state.apply(&Action::RequestCurrentUserSuccess {
            user: Some(user.clone()),
        });
        assert_eq!(state.session.user, Some(user));
    }

    #[test]
    fn logout_clears_session() {
        let mut state = AppState::default();
        state.session.token = Some(Token::new("abc", Utc::now()));
        state.session.user = User::from_value(json!({"id": 1}));
        state.apply(&Action::LogoutUserSuccess);
        assert_eq!(state.session, SessionState::default());
    }

    #[test]
    fn toast_lifecycle_is_tracked_by_id() {
        let mut state = AppState::default();
        state.apply(&Action::AddToast(toast("a")));
        state.apply(&Action::AddToast(toast("b")));
        state.apply(&Action::HideToast { id: ToastId::from("a") });

        assert!(!state.toast(&ToastId::from("a")).unwrap().visible);
        assert!(state.toast(&ToastId::from("b")).unwrap().visible);

        state.apply(&Action::RemoveToast { id: ToastId::from("a") });
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.toasts[0].id.as_str(), "b");
    }
}
