//! A single scheduled job.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::schedule::Trigger;

/// Zero-argument async callback invoked on every firing.
pub type JobCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// CronJob - a named, tagged cron trigger.
///
/// The job itself only tracks identity and fire count; the timer task that
/// drives it is owned by [`CronScheduler`](crate::CronScheduler).
pub struct CronJob {
    /// Job ID.
    id: Uuid,

    /// Human-readable name.
    name: String,

    /// Tags for bulk removal.
    tags: Vec<String>,

    /// Parsed trigger.
    trigger: Trigger,

    /// Cron expression string (for display).
    cron_expr: String,

    /// Invoked on every firing.
    callback: JobCallback,

    /// Cancelled when the job is removed or the scheduler shuts down.
    cancel: CancellationToken,

    /// Fire count.
    fire_count: AtomicU64,
}

impl CronJob {
    pub(crate) fn new(
        name: impl Into<String>,
        tags: Vec<String>,
        cron_expr: &str,
        trigger: Trigger,
        callback: JobCallback,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tags,
            trigger,
            cron_expr: cron_expr.to_string(),
            callback,
            cancel,
            fire_count: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn cron_expr(&self) -> &str {
        &self.cron_expr
    }

    pub(crate) fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Check if the job is still registered (not cancelled).
    pub fn is_valid(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::Relaxed)
    }

    /// Stop the job. Its timer task exits at the next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
        debug!("CronJob {} ({}) cancelled", self.name, self.id);
    }

    /// Get the next scheduled time.
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        if !self.is_valid() {
            return None;
        }
        self.trigger.next_after(&Utc::now())
    }

    /// Run the callback once.
    pub async fn fire(&self) {
        self.fire_count.fetch_add(1, Ordering::Relaxed);
        (self.callback)().await;
    }

    /// Snapshot for inspection.
    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            name: self.name.clone(),
            tags: self.tags.clone(),
            cron_expr: self.cron_expr.clone(),
            fire_count: self.fire_count(),
            next_run: self.next_fire_time(),
        }
    }
}

/// Point-in-time view of a registered job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub id: Uuid,
    pub name: String,
    pub tags: Vec<String>,
    pub cron_expr: String,
    pub fire_count: u64,
    pub next_run: Option<DateTime<Utc>>,
}
