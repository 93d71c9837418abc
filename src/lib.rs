//! # flowvisor
//!
//! **Flowvisor** is an effect-driven workflow orchestrator for client-side
//! session flows: authentication, session bootstrap and timed notifications.
//!
//! Long-lived **watchers** are bound to event kinds. When a trigger is
//! emitted, its watcher spawns a bounded **worker**; the worker emits further
//! events, calls a request executor, waits for sibling workflows and sleeps,
//! always through an [`Effects`] handle so that a superseded run stops at its
//! next step.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     app: login_user / logout_user / register_user / pop_toast / emit
//!                                   │
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus (synchronous dispatch, one lock)                             │
//! │   1. seq += 1                                                     │
//! │   2. Store.reduce(&event)          (AppState: session + toasts)   │
//! │   3. Watcher.dispatch(&event)      (matching trigger kind)        │
//! │   4. wake first matching waiter    (take / put_and_take)          │
//! │   5. tap.send(event)               (observers, may lag)           │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐    ┌──────────────┐
//!   │ login    │      │ token    │      │ toast    │    │ listener     │
//!   │ (latest) │      │ (latest) │ ...  │ (run-all)│    │ SubscriberSet│
//!   └────┬─────┘      └────┬─────┘      └────┬─────┘    └──────┬───────┘
//!        ▼                 ▼                 ▼                 ▼
//!   worker task       worker task       worker task      LogWriter, UI, ...
//!   Effects: put / take / put_and_take / call / delay / persist / select
//! ```
//!
//! ### Login workflow
//! ```text
//! LoginUser ──► login worker
//!   ├─ put_and_take(RequestToken) ──► token worker ──► call POST /oauth/token
//!   │                                   └─► RequestTokenSuccess | Failure (+ toast)
//!   ├─ persist accessToken / expiration
//!   ├─ put PopToast("Logged in") ──► toast worker: Add ─5s─► Hide ─0.5s─► Remove
//!   ├─ put_and_take(RequestCurrentUser) ──► current-user worker ──► call GET /user/current
//!   └─► LoginUserSuccess | LoginUserFailure (+ toast)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Orchestration** | Wire bus, store and watchers; graceful shutdown.              | [`Orchestrator`], [`OrchestratorBuilder`]   |
//! | **Workers**       | Built-in session workflows or your own.                       | [`Worker`], [`WorkerFn`], [`WatcherSpec`]   |
//! | **Policies**      | Latest-wins or run-all per watcher.                           | [`DispatchPolicy`]                          |
//! | **Events**        | Closed catalogue of actions and their kinds.                  | [`Action`], [`Event`], [`EventKind`]        |
//! | **State**         | Application state and session view.                           | [`Store`], [`SessionStore`]                 |
//! | **I/O**           | Request executor and durable storage boundaries.              | [`RequestExecutor`], [`Storage`]            |
//! | **Observers**     | Watch the event stream without blocking it.                   | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Normalized workflow and runtime errors.                       | [`FlowError`], [`RuntimeError`]             |
//!
//! ## Optional features
//! - `http` (default): reqwest-backed [`HttpExecutor`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flowvisor::{ApiResult, Config, EventKind, Orchestrator, Request, RequestExecutor, ToastRequest};
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl RequestExecutor for Offline {
//!     async fn execute(&self, _request: Request) -> ApiResult {
//!         ApiResult::err("offline")
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder(Config::default(), Arc::new(Offline)).build()?;
//!     let mut events = orch.subscribe();
//!
//!     orch.login_user("some@one.org", "testing");
//!     while let Ok(ev) = events.recv().await {
//!         if ev.is(EventKind::LoginUserFailure) {
//!             break;
//!         }
//!     }
//!
//!     orch.pop_toast(ToastRequest::success("Hi", "there"));
//!     orch.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod io;
mod runtime;
mod store;
mod subscribers;
mod workers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_TOAST_FADE, DEFAULT_TOAST_INTERVAL, Endpoints};
pub use error::{FlowError, RuntimeError, StorageError};
pub use events::{
    Action, Credentials, Event, EventKind, ICON_CHECK, ICON_ERROR, RegistrationDetails, Toast,
    ToastId, ToastRequest, Token, User,
};
pub use io::{
    ACCESS_TOKEN_KEY, ApiError, ApiResponse, ApiResult, EXPIRATION_KEY, Endpoint, FileStorage,
    MemoryStorage, Method, Request, RequestExecutor, Storage,
};
pub use runtime::{DispatchPolicy, Effects, Orchestrator, OrchestratorBuilder, Watcher, WatcherSpec};
pub use store::{AppState, SessionState, SessionStore, Store};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use workers::{
    LoginWorker, LogoutWorker, RegisterWorker, RequestCurrentUserWorker, RequestTokenWorker,
    ToastWorker, Worker, WorkerFn, WorkerRef, default_watchers,
};

// reqwest-backed executor.
// Enable with: `--features http` (on by default)
#[cfg(feature = "http")]
pub use io::HttpExecutor;
