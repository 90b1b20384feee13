//! Tagged cron scheduler.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SchedulerError;
use crate::job::{CronJob, JobCallback, JobInfo};
use crate::schedule::parse_schedule;

/// Process-wide cron scheduler.
///
/// Construct once at startup, share by `Arc`, call [`start`](Self::start)
/// to let timers fire and [`shutdown`](Self::shutdown) at exit. Jobs added
/// before `start` are armed but do not fire until the scheduler starts.
pub struct CronScheduler {
    jobs: DashMap<Uuid, Arc<CronJob>>,
    started: watch::Sender<bool>,
    shutdown: CancellationToken,
}

impl CronScheduler {
    pub fn new() -> Self {
        let (started, _) = watch::channel(false);
        Self {
            jobs: DashMap::new(),
            started,
            shutdown: CancellationToken::new(),
        }
    }

    /// Allow registered timers to fire.
    pub fn start(&self) {
        self.started.send_replace(true);
        info!("Cron scheduler started ({} jobs)", self.jobs.len());
    }

    pub fn is_running(&self) -> bool {
        *self.started.borrow() && !self.shutdown.is_cancelled()
    }

    /// Cancel every timer and refuse new jobs.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let removed = self.jobs.len();
        self.jobs.clear();
        info!("Cron scheduler shut down ({} jobs dropped)", removed);
    }

    /// Register a job. Its timer task is spawned immediately.
    ///
    /// # Errors
    ///
    /// `InvalidCron` if the expression does not parse, `ShutDown` after
    /// [`shutdown`](Self::shutdown).
    pub fn new_job(
        &self,
        cron_expr: &str,
        name: impl Into<String>,
        tags: Vec<String>,
        callback: JobCallback,
    ) -> Result<Uuid, SchedulerError> {
        if self.shutdown.is_cancelled() {
            return Err(SchedulerError::ShutDown);
        }

        let trigger = parse_schedule(cron_expr)?;
        let job = Arc::new(CronJob::new(
            name,
            tags,
            cron_expr,
            trigger,
            callback,
            self.shutdown.child_token(),
        ));
        let id = job.id();

        debug!(
            job_id = %id,
            name = job.name(),
            cron = job.cron_expr(),
            "Registered cron job"
        );

        self.jobs.insert(id, job.clone());
        tokio::spawn(run_timer(job, self.started.subscribe()));
        Ok(id)
    }

    /// Fire a job once, right away, without waiting for its callback.
    pub fn run_now(&self, id: Uuid) -> Result<(), SchedulerError> {
        let job = self
            .jobs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(SchedulerError::JobNotFound(id))?;

        debug!(job_id = %id, name = job.name(), "Running cron job now");
        tokio::spawn(async move {
            job.fire().await;
        });
        Ok(())
    }

    /// Remove one job. Returns whether it existed.
    pub fn remove_job(&self, id: Uuid) -> bool {
        match self.jobs.remove(&id) {
            Some((_, job)) => {
                job.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove every job carrying `tag`. Returns how many were removed.
    pub fn remove_by_tag(&self, tag: &str) -> usize {
        let ids: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().has_tag(tag))
            .map(|entry| *entry.key())
            .collect();

        ids.into_iter().filter(|id| self.remove_job(*id)).count()
    }

    pub fn job(&self, id: Uuid) -> Option<JobInfo> {
        self.jobs.get(&id).map(|entry| entry.value().info())
    }

    /// Jobs carrying `tag`, sorted by name.
    pub fn jobs_with_tag(&self, tag: &str) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().has_tag(tag))
            .map(|entry| entry.value().info())
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for CronScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer task: wait for the scheduler to start, then sleep to each cron
/// time point and await the callback, until the job is cancelled.
async fn run_timer(job: Arc<CronJob>, mut started: watch::Receiver<bool>) {
    let cancel = job.cancel_token().clone();

    tokio::select! {
        _ = cancel.cancelled() => return,
        result = started.wait_for(|running| *running) => {
            if result.is_err() {
                return;
            }
        }
    }

    // Anchor on the previous target so a time point never fires twice.
    let mut after = Utc::now();
    loop {
        let Some(next) = job.trigger().next_after(&after) else {
            debug!("CronJob {} has no upcoming schedule", job.name());
            return;
        };
        let delay = (next - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        after = next;
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = job.fire() => {}
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
