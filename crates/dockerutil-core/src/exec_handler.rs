//! Runs queued tasks inside their containers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dockerutil_runtime::{ContainerRuntime, LineStream, RuntimeError};
use dockerutil_workqueue::{CronJobTask, QueueError, TaskHandler};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::registry::JobRegistry;

/// Log target for in-container command output.
pub const EXEC_LOG_TARGET: &str = "dockerutil::exec";

/// [`TaskHandler`] that execs the task's command in its container and
/// forwards the output to the log.
///
/// A failure to create or attach the exec removes the container's jobs,
/// unless the container was re-registered after the task was produced.
pub struct ContainerExecHandler {
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<JobRegistry>,
    exec_timeout: Option<Duration>,
}

impl ContainerExecHandler {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, registry: Arc<JobRegistry>) -> Self {
        Self {
            runtime,
            registry,
            exec_timeout: None,
        }
    }

    /// Bound the time spent streaming a single command's output.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.exec_timeout = timeout;
        self
    }

    async fn stream_output(&self, task: &CronJobTask, output: &mut LineStream) {
        while let Some(line) = output.next().await {
            match line {
                Ok(line) => info!(
                    target: EXEC_LOG_TARGET,
                    container_id = %task.container_id,
                    command = %task.command,
                    "{}",
                    line
                ),
                Err(e) => {
                    warn!(
                        container_id = %task.container_id,
                        command = %task.command,
                        "Exec output stream failed: {}",
                        e
                    );
                    break;
                }
            }
        }
    }

    async fn log_exit_code(&self, task: &CronJobTask, exec_id: &str) {
        match self.runtime.exec_exit_code(exec_id).await {
            Ok(Some(0)) => debug!(
                container_id = %task.container_id,
                task = %task.task_name,
                "Cron job finished"
            ),
            Ok(Some(code)) => warn!(
                container_id = %task.container_id,
                task = %task.task_name,
                command = %task.command,
                exit_code = code,
                "Cron job exited with non-zero status"
            ),
            Ok(None) => debug!(
                container_id = %task.container_id,
                task = %task.task_name,
                "Cron job exit code unavailable"
            ),
            Err(e) => warn!(
                container_id = %task.container_id,
                task = %task.task_name,
                "Failed to read exec exit code: {}",
                e
            ),
        }
    }
}

#[async_trait]
impl TaskHandler for ContainerExecHandler {
    async fn handle(&self, task: &CronJobTask) -> Result<(), QueueError> {
        let argv = task.argv();
        if argv.is_empty() {
            return Err(QueueError::ExecutionFailed(format!(
                "empty command for task {}",
                task.task_name
            )));
        }

        let mut session = match self.runtime.exec(&task.container_id, argv).await {
            Ok(session) => session,
            Err(e) => {
                error!(
                    container_id = %task.container_id,
                    command = %task.command,
                    "Failed to execute cron job: {}",
                    e
                );
                if is_container_gone(&e) {
                    self.registry
                        .remove_if_current(&task.container_id, task.generation);
                }
                return Err(QueueError::ExecutionFailed(e.to_string()));
            }
        };

        info!(
            container_id = %task.container_id,
            task = %task.task_name,
            command = %task.command,
            "Cron job command output for container:"
        );

        match self.exec_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, self.stream_output(task, &mut session.output))
                    .await
                    .is_err()
                {
                    warn!(
                        container_id = %task.container_id,
                        command = %task.command,
                        "Cron job exceeded {:?}, no longer waiting for output",
                        limit
                    );
                    return Err(QueueError::ExecutionFailed(format!(
                        "timed out after {:?}",
                        limit
                    )));
                }
            }
            None => self.stream_output(task, &mut session.output).await,
        }

        self.log_exit_code(task, &session.exec_id).await;
        Ok(())
    }
}

/// Exec failures that mean the container can no longer run scheduled work.
fn is_container_gone(err: &RuntimeError) -> bool {
    err.is_exec_failure() || matches!(err, RuntimeError::NotFound(_))
}

#[cfg(test)]
#[path = "exec_handler_tests.rs"]
mod tests;
