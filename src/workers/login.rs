//! # Login worker.
//!
//! Composes the token and current-user workflows:
//!
//! ```text
//! LoginUser{email, password}
//!   ├─ not logged in?
//!   │    ├─ put RequestToken ──► take [RequestTokenSuccess | RequestTokenFailure]
//!   │    │                         failure → abort "Failed to log in!"
//!   │    └─ persist accessToken, expiration
//!   ├─ toast "Logged in"
//!   ├─ no current user?
//!   │    └─ put RequestCurrentUser ──► take [Success | Failure]
//!   │                                  failure   → abort "Failed to fetch current user!"
//!   │                                  no user   → "Got invalid response to current user request!"
//!   └─ LoginUserSuccess
//! any failure → LoginUserFailure{error} + toast "Error"
//! ```
//!
//! The "already logged in" check is advisory; exclusion between concurrent
//! logins comes from the latest-wins watcher.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FlowError;
use crate::events::{Action, Credentials, Event, EventKind, ToastRequest};
use crate::io::{ACCESS_TOKEN_KEY, EXPIRATION_KEY};
use crate::runtime::Effects;

use super::{Worker, report_failure};

const TOKEN_OUTCOMES: &[EventKind] = &[EventKind::RequestTokenSuccess, EventKind::RequestTokenFailure];
const USER_OUTCOMES: &[EventKind] = &[
    EventKind::RequestCurrentUserSuccess,
    EventKind::RequestCurrentUserFailure,
];

/// Authenticates a user and bootstraps the session.
pub struct LoginWorker;

impl LoginWorker {
    async fn login(&self, credentials: &Credentials, fx: &Effects) -> Result<(), FlowError> {
        if !fx.session().is_logged_in() {
            let reply = fx
                .put_and_take(Action::RequestToken(credentials.clone()), TOKEN_OUTCOMES)
                .await?;
            let Action::RequestTokenSuccess { token } = &reply.action else {
                return Err(FlowError::aborted("Failed to log in!"));
            };
            fx.persist_all(&[
                (ACCESS_TOKEN_KEY, Value::String(token.value.clone())),
                (EXPIRATION_KEY, Value::String(token.expiration_iso())),
            ])?;
        }

        fx.put(Action::PopToast(ToastRequest::success(
            "Logged in",
            "You have been authenticated.",
        )))?;

        if fx.session().current_user().is_none() {
            let reply = fx
                .put_and_take(Action::RequestCurrentUser, USER_OUTCOMES)
                .await?;
            match &reply.action {
                Action::RequestCurrentUserSuccess { user: Some(_) } => {}
                Action::RequestCurrentUserSuccess { user: None } => {
                    return Err(FlowError::protocol(
                        "Got invalid response to current user request!",
                    ));
                }
                _ => return Err(FlowError::aborted("Failed to fetch current user!")),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for LoginWorker {
    fn name(&self) -> &str {
        "login"
    }

    async fn run(&self, trigger: Arc<Event>, fx: Effects) -> Result<(), FlowError> {
        let Action::LoginUser(credentials) = &trigger.action else {
            return Ok(());
        };
        match self.login(credentials, &fx).await {
            Ok(()) => {
                fx.put(Action::LoginUserSuccess)?;
                Ok(())
            }
            Err(FlowError::Canceled) => Err(FlowError::Canceled),
            Err(error) => report_failure(&fx, Action::LoginUserFailure { error }, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::error::StorageError;
    use crate::events::{ICON_CHECK, ICON_ERROR};
    use crate::io::{ApiResult, MemoryStorage, Storage};
    use crate::runtime::Orchestrator;
    use crate::store::SessionStore;
    use crate::testing::{Harness, MockExecutor, bearer_grant, collect_until, kinds};

    fn is_toast_lifecycle(e: &Arc<Event>) -> bool {
        matches!(
            e.kind(),
            EventKind::AddToast | EventKind::HideToast | EventKind::RemoveToast
        )
    }

    fn workflow(events: &[Arc<Event>]) -> Vec<EventKind> {
        events
            .iter()
            .filter(|e| !is_toast_lifecycle(e))
            .map(|e| e.kind())
            .collect()
    }

    fn toasts(events: &[Arc<Event>]) -> Vec<ToastRequest> {
        events
            .iter()
            .filter_map(|e| match &e.action {
                Action::PopToast(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    fn happy_executor() -> MockExecutor {
        MockExecutor::new()
            .respond("/oauth/token", bearer_grant("abc", 3600))
            .respond("/user/current", ApiResult::ok(json!({"username": "someone"})))
    }

    #[tokio::test(start_paused = true)]
    async fn login_happy_path() {
        let mut h = Harness::new(happy_executor());

        h.orch.login_user("some@one.org", "testing");
        let mut events = h.until(EventKind::LoginUserSuccess).await;
        events.extend(h.drain(Duration::from_millis(1)).await);

        assert_eq!(
            workflow(&events),
            vec![
                EventKind::LoginUser,
                EventKind::RequestToken,
                EventKind::RequestTokenSuccess,
                EventKind::PopToast,
                EventKind::RequestCurrentUser,
                EventKind::RequestCurrentUserSuccess,
                EventKind::LoginUserSuccess,
            ]
        );
        let added = events.iter().find_map(|e| match &e.action {
            Action::AddToast(t) => Some(t.clone()),
            _ => None,
        });
        let added = added.expect("logged-in toast added");
        assert_eq!(added.title, "Logged in");
        assert_eq!(added.icon, ICON_CHECK);
        assert_eq!(added.message, "You have been authenticated.");

        assert_eq!(h.stored(ACCESS_TOKEN_KEY), Some(json!("abc")));
        let expiration = h.stored(EXPIRATION_KEY).expect("expiration stored");
        let expiration = expiration.as_str().expect("iso string");
        assert!(expiration.ends_with('Z'));
        let expires_at = DateTime::parse_from_rfc3339(expiration).unwrap();
        let ahead = expires_at.with_timezone(&Utc) - Utc::now();
        assert!(ahead > TimeDelta::minutes(59) && ahead <= TimeDelta::minutes(60));

        assert!(h.orch.store().is_logged_in());
        assert!(h.orch.store().current_user().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_grant_fails_the_login() {
        let mut h = Harness::new(
            MockExecutor::new().respond("/oauth/token", ApiResult::err("invalid_grant")),
        );

        h.orch.login_user("some@one.org", "wrong");
        let mut events = h.until(EventKind::LoginUserFailure).await;
        events.extend(h.drain(Duration::from_millis(1)).await);

        assert_eq!(
            workflow(&events),
            vec![
                EventKind::LoginUser,
                EventKind::RequestToken,
                EventKind::RequestTokenFailure,
                EventKind::PopToast,
                EventKind::LoginUserFailure,
                EventKind::PopToast,
            ]
        );
        let toasts = toasts(&events);
        assert_eq!(toasts[0].title, "Error!");
        assert_eq!(toasts[0].message, "invalid_grant");
        assert_eq!(toasts[1].title, "Error");
        assert_eq!(toasts[1].icon, ICON_ERROR);
        assert_eq!(toasts[1].message, "Failed to log in!");

        let login_failure = events
            .iter()
            .find(|e| e.is(EventKind::LoginUserFailure))
            .and_then(|e| e.action.error().cloned());
        assert_eq!(login_failure, Some(FlowError::aborted("Failed to log in!")));

        assert!(!h.orch.store().is_logged_in());
        assert!(h.storage.is_empty());
        assert_eq!(h.executor.calls_to("/user/current"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn persisted_session_skips_the_credential_exchange() {
        let storage = MemoryStorage::new();
        let expires = (Utc::now() + TimeDelta::hours(1)).to_rfc3339();
        storage.set(ACCESS_TOKEN_KEY, json!("kept")).unwrap();
        storage.set(EXPIRATION_KEY, json!(expires)).unwrap();
        let mut h = Harness::with_storage(happy_executor(), storage);
        assert!(h.orch.store().is_logged_in());

        h.orch.login_user("some@one.org", "testing");
        let events = h.until(EventKind::LoginUserSuccess).await;

        assert!(!kinds(&events).contains(&EventKind::RequestToken));
        assert_eq!(h.executor.calls_to("/oauth/token"), 0);
        assert_eq!(h.executor.calls_to("/user/current"), 1);
        assert_eq!(h.stored(ACCESS_TOKEN_KEY), Some(json!("kept")));
    }

    #[tokio::test(start_paused = true)]
    async fn current_user_failures_abort_the_login() {
        let mut h = Harness::new(
            MockExecutor::new()
                .respond("/oauth/token", bearer_grant("abc", 3600))
                .respond("/user/current", ApiResult::err("boom"))
                .respond("/user/current", ApiResult::ok(json!(null))),
        );

        h.orch.login_user("some@one.org", "testing");
        let first = h.until(EventKind::LoginUserFailure).await;
        assert_eq!(
            first.last().and_then(|e| e.action.error()),
            Some(&FlowError::aborted("Failed to fetch current user!"))
        );

        h.orch.login_user("some@one.org", "testing");
        let second = h.until(EventKind::LoginUserFailure).await;
        assert_eq!(
            second.last().and_then(|e| e.action.error()),
            Some(&FlowError::protocol(
                "Got invalid response to current user request!"
            ))
        );
        // Second attempt reuses the token obtained by the first.
        assert_eq!(h.executor.calls_to("/oauth/token"), 1);
    }

    struct NoExpiration(MemoryStorage);

    impl Storage for NoExpiration {
        fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
            if key == EXPIRATION_KEY {
                return Err(std::io::Error::other("disk full").into());
            }
            self.0.set(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.0.get(key)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_expiration_write_keeps_no_token() {
        let storage = Arc::new(NoExpiration(MemoryStorage::new()));
        let orch = Orchestrator::builder(Config::default(), happy_executor().arc())
            .with_storage(storage.clone())
            .build()
            .unwrap();
        let mut rx = orch.subscribe();

        orch.login_user("some@one.org", "testing");
        let events = collect_until(&mut rx, Duration::from_secs(1), |e| {
            e.is(EventKind::LoginUserFailure) || e.is(EventKind::LoginUserSuccess)
        })
        .await;

        let error = events.last().and_then(|e| e.action.error()).cloned();
        assert_eq!(error.map(|e| e.as_label()), Some("flow_storage"));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), Some(Value::Null));
        assert_eq!(storage.get(EXPIRATION_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn double_login_has_one_terminal_outcome() {
        let mut h = Harness::new(happy_executor());

        h.orch.login_user("some@one.org", "testing");
        h.orch.login_user("some@one.org", "testing");
        let events = h.drain(Duration::from_secs(1)).await;

        let terminal = events
            .iter()
            .filter(|e| e.is(EventKind::LoginUserSuccess) || e.is(EventKind::LoginUserFailure))
            .count();
        assert_eq!(terminal, 1);
        let requests = events.iter().filter(|e| e.is(EventKind::RequestToken)).count();
        assert_eq!(requests, 1);
    }
}
