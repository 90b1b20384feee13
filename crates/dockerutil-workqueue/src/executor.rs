//! Serial executor for queued tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::QueueError;
use crate::queue::ExecutionQueue;
use crate::task::CronJobTask;

/// Task handler trait.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute a task to completion.
    async fn handle(&self, task: &CronJobTask) -> Result<(), QueueError>;
}

/// The queue's sole consumer.
///
/// Tasks are processed one at a time; the next task is not dequeued until
/// the handler returns for the current one.
pub struct Executor {
    queue: Arc<ExecutionQueue>,
    handler: Arc<dyn TaskHandler>,
    running: AtomicBool,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
}

impl Executor {
    pub fn new(queue: Arc<ExecutionQueue>, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            queue,
            handler,
            running: AtomicBool::new(false),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn tasks_completed(&self) -> u64 {
        self.tasks_completed.load(Ordering::SeqCst)
    }

    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::SeqCst)
    }

    /// Process a single task.
    pub async fn process(&self, task: CronJobTask) {
        debug!(
            container_id = %task.container_id,
            task = %task.task_name,
            command = %task.command,
            "Executing task"
        );

        match self.handler.handle(&task).await {
            Ok(()) => {
                self.tasks_completed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                self.tasks_failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    container_id = %task.container_id,
                    task = %task.task_name,
                    command = %task.command,
                    "Task failed: {}",
                    e
                );
            }
        }
    }

    /// Consume the queue until `cancel` fires.
    ///
    /// A task in flight is abandoned at its next await point; tasks still
    /// queued are discarded.
    pub async fn run(&self, cancel: CancellationToken) {
        self.running.store(true, Ordering::SeqCst);
        info!("Executor started");

        loop {
            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                task = self.queue.dequeue() => task,
            };

            let Some(task) = task else {
                break;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.process(task) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Executor stopped ({} completed, {} failed, {} discarded)",
            self.tasks_completed(),
            self.tasks_failed(),
            self.queue.len()
        );
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
