//! The container runtime seam.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::RuntimeResult;
use crate::types::{ContainerMetadata, LifecycleEvent};

/// Output of an exec instance, one item per line.
pub type LineStream = BoxStream<'static, RuntimeResult<String>>;

/// Live container lifecycle events.
pub type EventStream = BoxStream<'static, RuntimeResult<LifecycleEvent>>;

/// An attached exec instance.
pub struct ExecSession {
    /// Engine-side exec ID, used to read the exit code once output closes.
    pub exec_id: String,
    /// Combined stdout/stderr, split into lines.
    pub output: LineStream,
}

impl std::fmt::Debug for ExecSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecSession")
            .field("exec_id", &self.exec_id)
            .finish_non_exhaustive()
    }
}

/// Operations dockerutil needs from a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// IDs of all running containers.
    async fn list_running(&self) -> RuntimeResult<Vec<String>>;

    /// Labels and health of one container.
    async fn inspect(&self, container_id: &str) -> RuntimeResult<ContainerMetadata>;

    /// Create an exec instance for `argv` and attach to its output.
    ///
    /// Fails with `ExecCreate` or `ExecAttach`.
    async fn exec(&self, container_id: &str, argv: Vec<String>) -> RuntimeResult<ExecSession>;

    /// Exit code of a finished exec instance, if the engine reports one.
    async fn exec_exit_code(&self, exec_id: &str) -> RuntimeResult<Option<i64>>;

    /// Restart a container, allowing `timeout_secs` for it to stop.
    async fn restart(&self, container_id: &str, timeout_secs: u64) -> RuntimeResult<()>;

    /// Subscribe to container-type lifecycle events.
    fn events(&self) -> EventStream;
}
