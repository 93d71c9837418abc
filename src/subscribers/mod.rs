//! # Observers of the event stream.
//!
//! Every event the bus delivers is also mirrored to a broadcast tap. The
//! orchestrator forwards the tap into a [`SubscriberSet`], which fans each
//! event out to user-provided [`Subscribe`] implementations.
//!
//! ```text
//! Bus.emit ──► tap ──► listener ──► SubscriberSet.emit(&event)
//!                                       ├──► LogWriter
//!                                       ├──► UI view
//!                                       └──► ...
//! ```
//!
//! Observers are passive: they cannot emit into or block workflows.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
