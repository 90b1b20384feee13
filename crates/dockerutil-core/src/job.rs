//! Typed job definitions.

use dockerutil_scheduler::parse_schedule;

use crate::error::JobError;

/// One scheduled command tied to one container, as declared by its labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub container_id: String,
    pub task_name: String,
    pub cron_spec: String,
    pub command: String,
    /// Fire once as soon as the job is registered.
    pub run_immediately: bool,
}

impl JobDefinition {
    /// Check that the job can be scheduled and executed.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.cron_spec.trim().is_empty() {
            return Err(JobError::MissingSpec {
                container_id: self.container_id.clone(),
                task_name: self.task_name.clone(),
            });
        }
        if self.command.trim().is_empty() {
            return Err(JobError::MissingCommand {
                container_id: self.container_id.clone(),
                task_name: self.task_name.clone(),
            });
        }
        parse_schedule(&self.cron_spec).map_err(|e| JobError::InvalidCron {
            container_id: self.container_id.clone(),
            task_name: self.task_name.clone(),
            spec: self.cron_spec.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
