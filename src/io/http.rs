//! # reqwest-backed request executor.
//!
//! Resolves endpoint paths against a base URL, sends the request data as a
//! JSON body and attaches the stored access token as a bearer header when a
//! [`Storage`] is configured.
//!
//! ## Mapping
//! ```text
//! transport error          → { success: false, error: transport message }
//! 2xx                      → { success: true, response: { data: body } }
//! non-2xx with error body  → { success: false, error: body message }
//! non-2xx without message  → { success: false, error: "HTTP <status>" }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::request::{ApiResult, Method, Request, RequestExecutor};
use super::storage::{ACCESS_TOKEN_KEY, Storage};

/// HTTP implementation of [`RequestExecutor`].
#[derive(Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
    storage: Option<Arc<dyn Storage>>,
}

impl HttpExecutor {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage: None,
        }
    }

    /// Reads the access token from `storage` for every request.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn bearer(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(ACCESS_TOKEN_KEY) {
            Ok(Some(Value::String(token))) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not read access token");
                None
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: Request) -> ApiResult {
        let url = self.url(&request.endpoint.url);
        let method = match request.endpoint.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }
        if let Some(token) = self.bearer() {
            builder = builder.bearer_auth(token);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%url, error = %e, "request failed");
                return ApiResult::err(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) if bytes.is_empty() => Value::Null,
            Ok(bytes) => serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) => return ApiResult::err(e.to_string()),
        };

        debug!(%url, status = status.as_u16(), "request completed");
        if status.is_success() {
            ApiResult::ok(body)
        } else {
            ApiResult::err(error_message(&body).unwrap_or_else(|| format!("HTTP {status}")))
        }
    }
}

/// Extracts a human-readable message from common error body shapes.
fn error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/error/message"),
        body.get("error_description"),
        body.get("message"),
        body.get("error"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::io::storage::MemoryStorage;

    #[tokio::test]
    async fn success_wraps_body_as_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({"grant_type": "password"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})))
            .mount(&server)
            .await;

        let exec = HttpExecutor::new(reqwest::Client::new(), server.uri());
        let result = exec
            .execute(Request::post("/oauth/token", json!({"grant_type": "password"})))
            .await;

        assert!(result.success);
        assert_eq!(result.response.unwrap().data["access_token"], "abc");
    }

    #[tokio::test]
    async fn error_status_carries_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let exec = HttpExecutor::new(reqwest::Client::new(), server.uri());
        let result = exec.execute(Request::post("/oauth/token", json!({}))).await;

        assert!(!result.success);
        assert_eq!(result.error.unwrap().message, "invalid_grant");
    }

    #[tokio::test]
    async fn error_status_without_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/current"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let exec = HttpExecutor::new(reqwest::Client::new(), server.uri());
        let result = exec.execute(Request::get("/user/current")).await;

        assert!(result.error.unwrap().message.starts_with("HTTP 503"));
    }

    #[tokio::test]
    async fn stored_token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/current"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCESS_TOKEN_KEY, json!("abc")).unwrap();
        let exec = HttpExecutor::new(reqwest::Client::new(), format!("{}/", server.uri()))
            .with_storage(storage);

        let result = exec.execute(Request::get("/user/current")).await;
        assert!(result.success, "{result:?}");
    }

    #[test]
    fn error_message_prefers_nested_message() {
        let body = json!({"error": {"message": "nested"}, "message": "flat"});
        assert_eq!(error_message(&body).as_deref(), Some("nested"));
        assert_eq!(error_message(&Value::Null), None);
    }
}
