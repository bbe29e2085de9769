mod cadence;
mod error;
mod runner;

pub use error::SchedulerError;
pub use runner::{AcquisitionScheduler, SchedulerSettings};
