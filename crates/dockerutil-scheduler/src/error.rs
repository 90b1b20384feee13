//! Scheduler errors.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression could not be parsed.
    #[error("Invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    /// No job with this ID is registered.
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// The scheduler has been shut down and accepts no new jobs.
    #[error("Scheduler is shut down")]
    ShutDown,
}
