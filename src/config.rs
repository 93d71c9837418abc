//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the orchestrator, and
//! [`Endpoints`], the request paths used by the network-facing workers.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait for workers at all
//! - `toast_interval = 0s` → falls back to [`DEFAULT_TOAST_INTERVAL`]

use std::time::Duration;

/// How long a toast stays visible unless the request says otherwise.
pub const DEFAULT_TOAST_INTERVAL: Duration = Duration::from_millis(5000);

/// Matches the UI fade-out transition.
pub const DEFAULT_TOAST_FADE: Duration = Duration::from_millis(500);

/// Global configuration for the orchestrator.
///
/// ## Field semantics
/// - `grace`: Maximum wait for running workers on shutdown
/// - `bus_capacity`: Ring buffer size of the observer tap (min 1)
/// - `toast_interval`: Default visible time of a toast
/// - `toast_fade`: Delay between hiding and removing a toast
/// - `token_type`: Token kind accepted from the credential exchange
/// - `endpoints`: Request paths
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for running workers on shutdown.
    pub grace: Duration,

    /// Capacity of the observer tap (broadcast ring buffer).
    ///
    /// Observers that lag behind more than `bus_capacity` events skip the
    /// oldest ones. Watchers and waiters are not affected.
    pub bus_capacity: usize,

    /// Default visible time of a toast.
    pub toast_interval: Duration,

    /// Delay between `HideToast` and `RemoveToast`.
    pub toast_fade: Duration,

    /// Token kind the request-token worker accepts.
    pub token_type: String,

    /// Request paths for the network-facing workers.
    pub endpoints: Endpoints,
}

impl Config {
    /// Returns the toast interval, falling back to the default for `0s`.
    #[inline]
    pub fn toast_interval(&self) -> Duration {
        if self.toast_interval == Duration::ZERO {
            DEFAULT_TOAST_INTERVAL
        } else {
            self.toast_interval
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `toast_interval = 5000ms`, `toast_fade = 500ms`
    /// - `token_type = "Bearer"`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            toast_interval: DEFAULT_TOAST_INTERVAL,
            toast_fade: DEFAULT_TOAST_FADE,
            token_type: "Bearer".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Request paths used by the workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// Credential exchange (`POST`).
    pub token: String,
    /// Current user (`GET`).
    pub current_user: String,
    /// Registration (`POST`).
    pub register: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: "/oauth/token".to_string(),
            current_user: "/user/current".to_string(),
            register: "/register".to_string(),
        }
    }
}
