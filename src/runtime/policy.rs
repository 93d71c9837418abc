//! # Per-watcher dispatch policy
//!
//! A watcher spawns one worker per trigger event. When a new trigger arrives
//! while an earlier worker of the same watcher is still running, the policy
//! decides what happens to the earlier one.
//!
//! ## Variants
//! - `LatestWins`: **cancel** the running worker and start the new one.
//! - `RunAll`: start the new one **alongside** any running workers.
//!
//! ## Invariants
//! - Under `LatestWins` at most one worker of a watcher can still emit events.
//! - A cancelled worker emits no terminal event.

/// Policy controlling how a watcher treats overlapping triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Cancel the previous worker of this watcher.
    ///
    /// Use when:
    /// - A new request invalidates the old one
    /// - Only the most recent exchange may complete
    /// - Example: credential exchange, login
    LatestWins,

    /// Every trigger gets its own independent worker.
    ///
    /// Use when:
    /// - Runs do not interfere with each other
    /// - Example: toast notifications
    RunAll,
}

impl DispatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchPolicy::LatestWins => "latest-wins",
            DispatchPolicy::RunAll => "run-all",
        }
    }
}
