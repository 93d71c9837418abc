//! External collaborators: the request executor and durable storage.
//!
//! Both are traits so the orchestrator can run against real backends
//! ([`HttpExecutor`], [`FileStorage`]) or test doubles.

#[cfg(feature = "http")]
mod http;
mod request;
mod storage;

#[cfg(feature = "http")]
pub use http::HttpExecutor;
pub use request::{ApiError, ApiResponse, ApiResult, Endpoint, Method, Request, RequestExecutor};
pub use storage::{ACCESS_TOKEN_KEY, EXPIRATION_KEY, FileStorage, MemoryStorage, Storage};
