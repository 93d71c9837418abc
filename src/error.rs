//! Error types used by the flowvisor runtime and its workers.
//!
//! This module defines three error enums:
//!
//! - [`FlowError`]: the single normalized failure a workflow can end with.
//! - [`RuntimeError`]: errors raised by the orchestrator itself.
//! - [`StorageError`]: errors raised by durable storage backends.
//!
//! All of them provide `as_label` for logs. [`FlowError`] is carried inside
//! failure events, so it is `Clone` and its `Display` is the human-readable
//! message shown to the user.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// # Errors a workflow can terminate with.
///
/// Every external-call failure, protocol violation and unspecified failure is
/// normalized into one of these variants before it is turned into a failure
/// event and an error toast. `Display` yields only the message.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowError {
    /// The request executor reported an explicit error.
    #[error("{message}")]
    External {
        /// Message from the executor's error field.
        message: String,
    },

    /// The response had an unexpected shape (wrong token kind, missing user, ...).
    #[error("{message}")]
    Protocol {
        /// What was wrong with the response.
        message: String,
    },

    /// The response carried neither a success marker nor an error.
    #[error("{message}")]
    Unspecified {
        /// Generic message for this workflow.
        message: String,
    },

    /// A workflow this one depends on ended in failure.
    #[error("{message}")]
    Aborted {
        /// Message describing which step was aborted.
        message: String,
    },

    /// Durable storage rejected a write.
    #[error("{message}")]
    Storage {
        /// Storage failure message.
        message: String,
    },

    /// The worker was superseded by a newer dispatch (or the runtime is shutting down).
    ///
    /// Never surfaced as a failure event.
    #[error("workflow cancelled")]
    Canceled,
}

impl FlowError {
    pub fn external(message: impl Into<String>) -> Self {
        FlowError::External {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        FlowError::Protocol {
            message: message.into(),
        }
    }

    pub fn unspecified(message: impl Into<String>) -> Self {
        FlowError::Unspecified {
            message: message.into(),
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        FlowError::Aborted {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use flowvisor::FlowError;
    ///
    /// let err = FlowError::protocol("Unable to use token of type mac");
    /// assert_eq!(err.as_label(), "flow_protocol");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FlowError::External { .. } => "flow_external",
            FlowError::Protocol { .. } => "flow_protocol",
            FlowError::Unspecified { .. } => "flow_unspecified",
            FlowError::Aborted { .. } => "flow_aborted",
            FlowError::Storage { .. } => "flow_storage",
            FlowError::Canceled => "flow_canceled",
        }
    }

    /// Returns the human-readable message (same as `Display`).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// True for the silent cancellation case.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, FlowError::Canceled)
    }
}

impl From<StorageError> for FlowError {
    fn from(e: StorageError) -> Self {
        FlowError::Storage {
            message: e.to_string(),
        }
    }
}

/// # Errors produced by the orchestrator runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The orchestrator was built outside a Tokio runtime.
    #[error("no Tokio runtime available to spawn workers on")]
    NoRuntime,

    /// Shutdown grace period was exceeded; some workers were still running.
    #[error("shutdown timeout {grace:?} exceeded; {running} worker(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of workers that did not finish in time.
        running: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use flowvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), running: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRuntime => "runtime_missing",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by durable storage backends.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file did not contain a JSON object.
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "storage_io",
            StorageError::Json(_) => "storage_json",
        }
    }
}
