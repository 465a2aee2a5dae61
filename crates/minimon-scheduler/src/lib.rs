//! # minimon Scheduler
//!
//! Runs a fixed set of [`PeriodicTask`]s, either one after the other
//! (serial) or through a bounded worker pool (parallel).

mod scheduler;
mod task;

pub use scheduler::{MAX_SLEEP, MIN_SLEEP, Scheduler};
pub use task::PeriodicTask;
