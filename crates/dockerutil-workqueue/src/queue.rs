//! Bounded FIFO execution queue.

use std::sync::atomic::{AtomicU64, Ordering};

use dockerutil_config::{BackpressurePolicy, QueueConfig};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::task::CronJobTask;

/// Bounded, strictly FIFO, single-consumer queue.
///
/// Under [`BackpressurePolicy::Block`] producers wait while the queue is
/// full. Under [`BackpressurePolicy::DropNewest`] the incoming task is
/// discarded and counted instead.
pub struct ExecutionQueue {
    capacity: usize,
    policy: BackpressurePolicy,
    sender: mpsc::Sender<CronJobTask>,
    receiver: Mutex<mpsc::Receiver<CronJobTask>>,
    dropped: AtomicU64,
}

impl ExecutionQueue {
    /// Create a new queue. A zero capacity is raised to one.
    pub fn new(config: &QueueConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        info!(
            "Execution queue created (capacity {}, policy {:?})",
            capacity, config.backpressure
        );
        Self {
            capacity,
            policy: config.backpressure,
            sender,
            receiver: Mutex::new(receiver),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a task.
    ///
    /// # Errors
    ///
    /// `QueueFull` when the queue is full under the drop policy.
    pub async fn enqueue(&self, task: CronJobTask) -> Result<(), QueueError> {
        debug!(
            container_id = %task.container_id,
            task = %task.task_name,
            "Enqueue task"
        );

        match self.policy {
            BackpressurePolicy::Block => self
                .sender
                .send(task)
                .await
                .map_err(|_| QueueError::Closed),
            BackpressurePolicy::DropNewest => match self.sender.try_send(task) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(task)) => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        container_id = %task.container_id,
                        task = %task.task_name,
                        dropped,
                        "Execution queue full, task dropped"
                    );
                    Err(QueueError::QueueFull)
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(QueueError::Closed),
            },
        }
    }

    /// Wait for the next task.
    pub async fn dequeue(&self) -> Option<CronJobTask> {
        self.receiver.lock().await.recv().await
    }

    /// Take the next task if one is ready.
    pub async fn try_dequeue(&self) -> Option<CronJobTask> {
        self.receiver.lock().await.try_recv().ok()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Tasks discarded under the drop policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
