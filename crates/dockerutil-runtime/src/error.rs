//! Runtime error types.

use thiserror::Error;

/// Errors returned by a [`ContainerRuntime`](crate::ContainerRuntime).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Could not reach the container engine.
    #[error("Failed to connect to container runtime: {0}")]
    Connect(String),

    /// The container (or exec instance) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Creating the exec instance failed.
    #[error("Failed to create exec in {container_id}: {message}")]
    ExecCreate {
        container_id: String,
        message: String,
    },

    /// Starting or attaching to the exec instance failed.
    #[error("Failed to attach to exec in {container_id}: {message}")]
    ExecAttach {
        container_id: String,
        message: String,
    },

    /// The event subscription failed mid-stream.
    #[error("Event stream error: {0}")]
    EventStream(String),

    /// Any other engine API failure.
    #[error("Container runtime API error: {0}")]
    Api(String),
}

impl RuntimeError {
    /// Whether this error came from creating or attaching an exec instance.
    pub fn is_exec_failure(&self) -> bool {
        matches!(
            self,
            RuntimeError::ExecCreate { .. } | RuntimeError::ExecAttach { .. }
        )
    }
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => RuntimeError::NotFound(message),
            other => RuntimeError::Api(other.to_string()),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
