//! Data carried by events: credentials, tokens, users and toasts.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Icon shown on success toasts.
pub const ICON_CHECK: &str = "check";
/// Icon shown on error toasts.
pub const ICON_ERROR: &str = "times-circle";

/// Email/password pair used for the credential exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email_address: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email_address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email_address", &self.email_address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User-supplied registration details.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetails {
    pub email_address: String,
    pub password: String,
    pub username: String,
}

impl RegistrationDetails {
    pub fn new(
        email_address: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            email_address: email_address.into(),
            password: password.into(),
            username: username.into(),
        }
    }
}

impl fmt::Debug for RegistrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDetails")
            .field("email_address", &self.email_address)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Bearer token with its absolute expiration.
///
/// Value and expiration always travel together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// True once `now` has reached the expiration.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Expiration as an ISO-8601 UTC string with millisecond precision
    /// (`2024-01-01T12:00:00.000Z`), the format persisted to durable storage.
    pub fn expiration_iso(&self) -> String {
        self.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Opaque identity record of the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(serde_json::Value);

impl User {
    /// Wraps a response payload; `null` means "no user".
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        if value.is_null() { None } else { Some(Self(value)) }
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Looks up a top-level field of the record.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }
}

/// Stable identifier of a toast across its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(String);

impl ToastId {
    /// Generates a fresh unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToastId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ToastId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Request to show a toast; `id` and `interval` are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastRequest {
    pub id: Option<ToastId>,
    pub title: String,
    pub icon: String,
    pub message: String,
    pub interval: Option<Duration>,
}

impl ToastRequest {
    pub fn new(
        title: impl Into<String>,
        icon: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            icon: icon.into(),
            message: message.into(),
            interval: None,
        }
    }

    /// Success toast with the check icon.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, ICON_CHECK, message)
    }

    /// Error toast with the error icon.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, ICON_ERROR, message)
    }

    pub fn with_id(mut self, id: impl Into<ToastId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

/// A toast as it lives in the application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub title: String,
    pub icon: String,
    pub message: String,
    pub visible: bool,
    pub interval: Duration,
}

impl Toast {
    /// Resolves a request into a visible toast.
    ///
    /// Keeps the caller's id when present and generates one otherwise; a
    /// missing or zero interval becomes `default_interval`.
    pub fn from_request(req: ToastRequest, default_interval: Duration) -> Self {
        let interval = req
            .interval
            .filter(|d| *d > Duration::ZERO)
            .unwrap_or(default_interval);
        Self {
            id: req.id.unwrap_or_else(ToastId::generate),
            title: req.title,
            icon: req.icon,
            message: req.message,
            visible: true,
            interval,
        }
    }
}
