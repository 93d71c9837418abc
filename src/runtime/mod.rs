//! # Workflow runtime.
//!
//! - [`Orchestrator`] / [`OrchestratorBuilder`]: wiring and shutdown
//! - [`Watcher`] / [`WatcherSpec`]: trigger kind → worker under a [`DispatchPolicy`]
//! - [`Effects`]: what a worker may do
//! - `run_worker`: runs one worker and logs how it ended

mod builder;
mod effects;
mod orchestrator;
mod policy;
mod runner;
mod watcher;

pub use builder::OrchestratorBuilder;
pub use effects::Effects;
pub use orchestrator::Orchestrator;
pub use policy::DispatchPolicy;
pub use watcher::{Watcher, WatcherSpec};
