//! # Request-token worker: credential exchange.
//!
//! ```text
//! RequestToken{email, password}
//!   └─► call POST /oauth/token {grant_type:"password", username, password}
//!         ├─ ok, token_type == Bearer → RequestTokenSuccess{token}
//!         └─ anything else            → RequestTokenFailure{error} + toast "Error!"
//! ```
//!
//! The worker does not persist the token; the login workflow does.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::FlowError;
use crate::events::{Action, Credentials, Event, Token};
use crate::io::Request;
use crate::runtime::Effects;

use super::Worker;
use super::report_failure;

const INVALID_RESPONSE: &str = "Got invalid response to token request!";
const UNSPECIFIED: &str = "Request failed for an unspecified reason!";

/// Fields read from the token endpoint's response data.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

/// Exchanges credentials for a bearer token.
pub struct RequestTokenWorker;

impl RequestTokenWorker {
    async fn exchange(&self, credentials: &Credentials, fx: &Effects) -> Result<Token, FlowError> {
        let body = json!({
            "grant_type": "password",
            "username": credentials.email_address,
            "password": credentials.password,
        });
        let result = fx
            .call(Request::post(fx.config().endpoints.token.clone(), body))
            .await?;
        let data = result.into_data(UNSPECIFIED)?;
        parse_grant(data, &fx.config().token_type)
    }
}

fn parse_grant(data: Value, accepted_type: &str) -> Result<Token, FlowError> {
    let grant: TokenGrant =
        serde_json::from_value(data).map_err(|_| FlowError::protocol(INVALID_RESPONSE))?;

    let token_type = grant
        .token_type
        .ok_or_else(|| FlowError::protocol(INVALID_RESPONSE))?;
    if token_type != accepted_type {
        return Err(FlowError::protocol(format!(
            "Unable to use token of type {token_type}"
        )));
    }

    let (Some(value), Some(expires_in)) = (grant.access_token, grant.expires_in) else {
        return Err(FlowError::protocol(INVALID_RESPONSE));
    };
    let expires_at = TimeDelta::try_seconds(expires_in)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| FlowError::protocol(INVALID_RESPONSE))?;

    Ok(Token::new(value, expires_at))
}

#[async_trait]
impl Worker for RequestTokenWorker {
    fn name(&self) -> &str {
        "request-token"
    }

    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        let Action::RequestToken(credentials) = &trigger.action else {
            return Ok(());
        };
        match self.exchange(credentials, &fx).await {
            Ok(token) => {
                fx.put(Action::RequestTokenSuccess { token })?;
                Ok(())
            }
            Err(FlowError::Canceled) => Err(FlowError::Canceled),
            Err(error) => report_failure(&fx, Action::RequestTokenFailure { error }, "Error!"),
        }
    }
}
