//! Container-to-jobs registry over the cron scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dockerutil_scheduler::{CronScheduler, JobCallback, JobInfo};
use dockerutil_workqueue::{CronJobTask, ExecutionQueue};
use futures::FutureExt;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::JobError;
use crate::job::JobDefinition;

/// Outcome of registering one container's job set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Generation the jobs were registered under.
    pub generation: u64,
    /// Task names that were scheduled.
    pub registered: Vec<String>,
    /// Number of definitions that failed validation or scheduling.
    pub failed: usize,
}

/// Owns the mapping from container to its scheduled jobs.
///
/// Every job is tagged with its container ID; removal is always by tag.
/// Each registration of a container bumps its generation, which tasks carry
/// so stale failures can be recognized. Registration and removal hold the
/// container's generation entry for their whole duration, so they never
/// interleave for the same container.
pub struct JobRegistry {
    scheduler: Arc<CronScheduler>,
    queue: Arc<ExecutionQueue>,
    generations: DashMap<String, u64>,
    next_generation: AtomicU64,
}

impl JobRegistry {
    pub fn new(scheduler: Arc<CronScheduler>, queue: Arc<ExecutionQueue>) -> Self {
        Self {
            scheduler,
            queue,
            generations: DashMap::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn scheduler(&self) -> &Arc<CronScheduler> {
        &self.scheduler
    }

    /// Schedule a single job under the container's current generation.
    pub fn add(&self, job: &JobDefinition) -> Result<Uuid, JobError> {
        let generation = *self
            .generations
            .entry(job.container_id.clone())
            .or_insert_with(|| self.bump());
        self.add_with_generation(job, generation)
    }

    /// Replace the container's jobs with `jobs`.
    ///
    /// Existing jobs are removed first, so repeated registration never
    /// duplicates triggers. A failing definition is logged and skipped; its
    /// siblings are still registered.
    pub fn register_container(&self, container_id: &str, jobs: &[JobDefinition]) -> Registration {
        // The entry stays locked until the new job set is scheduled.
        let mut current = self.generations.entry(container_id.to_string()).or_insert(0);
        self.scheduler.remove_by_tag(container_id);

        let generation = self.bump();
        *current = generation;

        let mut registration = Registration {
            generation,
            ..Default::default()
        };
        for job in jobs {
            match self.add_with_generation(job, generation) {
                Ok(_) => registration.registered.push(job.task_name.clone()),
                Err(e) => {
                    error!(
                        container_id,
                        task = %job.task_name,
                        "Failed to add cron job: {}",
                        e
                    );
                    registration.failed += 1;
                }
            }
        }
        registration
    }

    /// Remove every job of a container. A no-op for untracked containers.
    pub fn remove_all_for_container(&self, container_id: &str) -> usize {
        let entry = self.generations.entry(container_id.to_string());
        let removed = self.scheduler.remove_by_tag(container_id);
        if let Entry::Occupied(entry) = entry {
            entry.remove();
        }
        info!(container_id, removed, "All cron jobs removed");
        removed
    }

    /// Remove the container's jobs only if they still belong to `generation`.
    ///
    /// Returns whether anything was removed.
    pub fn remove_if_current(&self, container_id: &str, generation: u64) -> bool {
        match self.generations.entry(container_id.to_string()) {
            Entry::Occupied(entry) if *entry.get() == generation => {
                let removed = self.scheduler.remove_by_tag(container_id);
                entry.remove();
                info!(container_id, removed, "All cron jobs removed");
                true
            }
            _ => {
                debug!(
                    container_id,
                    generation, "Registration changed since task was queued, keeping jobs"
                );
                false
            }
        }
    }

    /// Current generation of a tracked container.
    pub fn generation(&self, container_id: &str) -> Option<u64> {
        self.generations.get(container_id).map(|g| *g)
    }

    pub fn is_tracked(&self, container_id: &str) -> bool {
        self.generations.contains_key(container_id)
    }

    /// IDs of all tracked containers, sorted.
    pub fn tracked_containers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.generations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Jobs currently scheduled for a container.
    pub fn jobs_for(&self, container_id: &str) -> Vec<JobInfo> {
        self.scheduler.jobs_with_tag(container_id)
    }

    pub fn job_count(&self, container_id: &str) -> usize {
        self.jobs_for(container_id).len()
    }

    fn bump(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    fn add_with_generation(&self, job: &JobDefinition, generation: u64) -> Result<Uuid, JobError> {
        job.validate()?;

        let task = CronJobTask::new(
            job.container_id.clone(),
            job.task_name.clone(),
            job.command.clone(),
            generation,
        );
        let queue = self.queue.clone();
        let callback: JobCallback = Arc::new(move || {
            let queue = queue.clone();
            let task = task.clone();
            async move {
                let container_id = task.container_id.clone();
                let task_name = task.task_name.clone();
                if let Err(e) = queue.enqueue(task).await {
                    debug!(
                        container_id = %container_id,
                        task = %task_name,
                        "Task not enqueued: {}",
                        e
                    );
                }
            }
            .boxed()
        });

        let id = self.scheduler.new_job(
            &job.cron_spec,
            job.task_name.clone(),
            vec![job.container_id.clone()],
            callback,
        )?;
        info!(
            container_id = %job.container_id,
            task = %job.task_name,
            "Added cron job"
        );

        if job.run_immediately {
            self.scheduler.run_now(id)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
