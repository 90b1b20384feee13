//! Core error types.

use dockerutil_config::ConfigError;
use dockerutil_runtime::RuntimeError;
use dockerutil_scheduler::SchedulerError;
use thiserror::Error;

/// Why a job definition could not be registered.
#[derive(Debug, Error)]
pub enum JobError {
    /// No `.spec` label for the task.
    #[error("Job {task_name} on {container_id} has no cron spec")]
    MissingSpec {
        container_id: String,
        task_name: String,
    },

    /// No `.cmd` label for the task, or it is blank.
    #[error("Job {task_name} on {container_id} has no command")]
    MissingCommand {
        container_id: String,
        task_name: String,
    },

    /// The cron spec does not parse.
    #[error("Job {task_name} on {container_id} has invalid cron spec '{spec}': {reason}")]
    InvalidCron {
        container_id: String,
        task_name: String,
        spec: String,
        reason: String,
    },

    /// The scheduler refused the job.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Errors that abort the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The container runtime is unreachable.
    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Listing running containers at startup failed.
    #[error("Initial container snapshot failed: {0}")]
    Snapshot(RuntimeError),

    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// A background loop panicked or was aborted.
    #[error("Task join error: {0}")]
    Join(String),
}
