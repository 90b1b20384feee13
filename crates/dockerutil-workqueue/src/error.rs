//! Queue errors.

use thiserror::Error;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue is full and the policy drops new tasks.
    #[error("Queue is full")]
    QueueFull,

    /// Consumer side is gone.
    #[error("Queue is closed")]
    Closed,

    /// Task execution failed.
    #[error("Task execution failed: {0}")]
    ExecutionFailed(String),
}
