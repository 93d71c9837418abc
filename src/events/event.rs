//! # Events flowing through the orchestrator.
//!
//! [`Action`] is a closed tagged union with one variant per event kind, each
//! carrying only the fields that kind defines. [`EventKind`] is its fieldless
//! mirror, used by watchers and await-any sets to match without looking at
//! payloads.
//!
//! The kinds fall into three groups:
//! - **Triggers**: start a workflow (`LoginUser`, `RequestToken`, `PopToast`, ...)
//! - **Outcomes**: terminate a workflow (`*Success` / `*Failure`)
//! - **Toast lifecycle**: `AddToast`, `HideToast`, `RemoveToast`
//!
//! ## Ordering guarantees
//! The bus assigns `seq` while holding its dispatch lock, so `seq` order is
//! exactly the order in which listeners observed the events.

use std::fmt;
use std::time::SystemTime;

use crate::error::FlowError;

use super::payload::{Credentials, RegistrationDetails, Toast, ToastId, ToastRequest, Token, User};

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Login ===
    LoginUser,
    LoginUserSuccess,
    LoginUserFailure,

    // === Logout ===
    LogoutUser,
    LogoutUserSuccess,
    LogoutUserFailure,

    // === Registration ===
    RegisterUser,
    RegisterUserSuccess,
    RegisterUserFailure,

    // === Credential exchange ===
    RequestToken,
    RequestTokenSuccess,
    RequestTokenFailure,

    // === Current user ===
    RequestCurrentUser,
    RequestCurrentUserSuccess,
    RequestCurrentUserFailure,

    // === Toasts ===
    PopToast,
    AddToast,
    HideToast,
    RemoveToast,
}

impl EventKind {
    /// Catalogue name of the kind (e.g. `REQUEST_TOKEN_SUCCESS`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::LoginUser => "LOGIN_USER",
            EventKind::LoginUserSuccess => "LOGIN_USER_SUCCESS",
            EventKind::LoginUserFailure => "LOGIN_USER_FAILURE",
            EventKind::LogoutUser => "LOGOUT_USER",
            EventKind::LogoutUserSuccess => "LOGOUT_USER_SUCCESS",
            EventKind::LogoutUserFailure => "LOGOUT_USER_FAILURE",
            EventKind::RegisterUser => "REGISTER_USER",
            EventKind::RegisterUserSuccess => "REGISTER_USER_SUCCESS",
            EventKind::RegisterUserFailure => "REGISTER_USER_FAILURE",
            EventKind::RequestToken => "REQUEST_TOKEN",
            EventKind::RequestTokenSuccess => "REQUEST_TOKEN_SUCCESS",
            EventKind::RequestTokenFailure => "REQUEST_TOKEN_FAILURE",
            EventKind::RequestCurrentUser => "REQUEST_CURRENT_USER",
            EventKind::RequestCurrentUserSuccess => "REQUEST_CURRENT_USER_SUCCESS",
            EventKind::RequestCurrentUserFailure => "REQUEST_CURRENT_USER_FAILURE",
            EventKind::PopToast => "POP_TOAST",
            EventKind::AddToast => "ADD_TOAST",
            EventKind::HideToast => "HIDE_TOAST",
            EventKind::RemoveToast => "REMOVE_TOAST",
        }
    }

    /// True for kinds that start a workflow.
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            EventKind::LoginUser
                | EventKind::LogoutUser
                | EventKind::RegisterUser
                | EventKind::RequestToken
                | EventKind::RequestCurrentUser
                | EventKind::PopToast
        )
    }

    /// True for kinds that end a workflow in failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::LoginUserFailure
                | EventKind::LogoutUserFailure
                | EventKind::RegisterUserFailure
                | EventKind::RequestTokenFailure
                | EventKind::RequestCurrentUserFailure
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened, or what is being requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoginUser(Credentials),
    LoginUserSuccess,
    LoginUserFailure { error: FlowError },

    LogoutUser,
    LogoutUserSuccess,
    LogoutUserFailure { error: FlowError },

    RegisterUser(RegistrationDetails),
    RegisterUserSuccess,
    RegisterUserFailure { error: FlowError },

    RequestToken(Credentials),
    RequestTokenSuccess { token: Token },
    RequestTokenFailure { error: FlowError },

    RequestCurrentUser,
    /// `user` is `None` when the endpoint answered without a payload.
    RequestCurrentUserSuccess { user: Option<User> },
    RequestCurrentUserFailure { error: FlowError },

    PopToast(ToastRequest),
    AddToast(Toast),
    HideToast { id: ToastId },
    RemoveToast { id: ToastId },
}

impl Action {
    pub fn kind(&self) -> EventKind {
        match self {
            Action::LoginUser(_) => EventKind::LoginUser,
            Action::LoginUserSuccess => EventKind::LoginUserSuccess,
            Action::LoginUserFailure { .. } => EventKind::LoginUserFailure,
            Action::LogoutUser => EventKind::LogoutUser,
            Action::LogoutUserSuccess => EventKind::LogoutUserSuccess,
            Action::LogoutUserFailure { .. } => EventKind::LogoutUserFailure,
            Action::RegisterUser(_) => EventKind::RegisterUser,
            Action::RegisterUserSuccess => EventKind::RegisterUserSuccess,
            Action::RegisterUserFailure { .. } => EventKind::RegisterUserFailure,
            Action::RequestToken(_) => EventKind::RequestToken,
            Action::RequestTokenSuccess { .. } => EventKind::RequestTokenSuccess,
            Action::RequestTokenFailure { .. } => EventKind::RequestTokenFailure,
            Action::RequestCurrentUser => EventKind::RequestCurrentUser,
            Action::RequestCurrentUserSuccess { .. } => EventKind::RequestCurrentUserSuccess,
            Action::RequestCurrentUserFailure { .. } => EventKind::RequestCurrentUserFailure,
            Action::PopToast(_) => EventKind::PopToast,
            Action::AddToast(_) => EventKind::AddToast,
            Action::HideToast { .. } => EventKind::HideToast,
            Action::RemoveToast { .. } => EventKind::RemoveToast,
        }
    }

    /// The error carried by a failure outcome.
    pub fn error(&self) -> Option<&FlowError> {
        match self {
            Action::LoginUserFailure { error }
            | Action::LogoutUserFailure { error }
            | Action::RegisterUserFailure { error }
            | Action::RequestTokenFailure { error }
            | Action::RequestCurrentUserFailure { error } => Some(error),
            _ => None,
        }
    }
}

/// An emitted action with its delivery metadata.
///
/// - `seq`: position in the bus's delivery order
/// - `at`: wall-clock timestamp (for logs)
#[derive(Debug, Clone)]
pub struct Event {
    /// Monotonically increasing per bus, assigned at emission.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Payload.
    pub action: Action,
}

impl Event {
    pub(crate) fn new(seq: u64, action: Action) -> Self {
        Self {
            seq,
            at: SystemTime::now(),
            action,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.action.kind()
    }

    #[inline]
    pub fn is(&self, kind: EventKind) -> bool {
        self.kind() == kind
    }
}
