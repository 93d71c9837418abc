//! # Request executor boundary.
//!
//! The orchestrator never talks HTTP itself. Workers describe a [`Request`]
//! and hand it to a [`RequestExecutor`], which answers with an [`ApiResult`]:
//!
//! ```text
//! { success: bool, response: { data }, error: { message } }
//! ```
//!
//! [`ApiResult::into_data`] folds the three possible shapes into the error
//! taxonomy: `success` → data, explicit `error` → [`FlowError::External`],
//! neither → [`FlowError::Unspecified`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FlowError;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Path and method of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub method: Method,
}

/// One call to the request executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: Endpoint,
    pub data: Option<Value>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint {
                url: url.into(),
                method: Method::Get,
            },
            data: None,
        }
    }

    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self {
            endpoint: Endpoint {
                url: url.into(),
                method: Method::Post,
            },
            data: Some(data),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub data: Value,
}

/// Explicit error reported by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// Outcome of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<ApiResponse>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl ApiResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            response: Some(ApiResponse { data }),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(ApiError {
                message: message.into(),
            }),
        }
    }

    /// Neither success nor an error.
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// Returns the response data, or the normalized failure.
    ///
    /// `unspecified` is the message used when the result carries neither a
    /// success marker nor an error.
    pub fn into_data(self, unspecified: &str) -> Result<Value, FlowError> {
        if self.success {
            return Ok(self.response.map(|r| r.data).unwrap_or(Value::Null));
        }
        match self.error {
            Some(e) => Err(FlowError::External { message: e.message }),
            None => Err(FlowError::unspecified(unspecified)),
        }
    }
}

/// Black-box RPC boundary.
///
/// Implementations should never panic and should report transport failures
/// as `ApiResult { success: false, error: Some(..) }`.
#[async_trait]
pub trait RequestExecutor: Send + Sync + 'static {
    async fn execute(&self, request: Request) -> ApiResult;
}
