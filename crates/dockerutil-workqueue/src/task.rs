//! Queue element.

/// One execution request: run `command` inside `container_id`.
///
/// Duplicates are legal; every enqueued task is executed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronJobTask {
    /// Target container.
    pub container_id: String,
    /// Task name the job was registered under.
    pub task_name: String,
    /// Whitespace-delimited command line.
    pub command: String,
    /// Registry generation of the container when the task was produced.
    pub generation: u64,
}

impl CronJobTask {
    pub fn new(
        container_id: impl Into<String>,
        task_name: impl Into<String>,
        command: impl Into<String>,
        generation: u64,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            task_name: task_name.into(),
            command: command.into(),
            generation,
        }
    }

    /// Command split on whitespace. No quoting rules apply.
    pub fn argv(&self) -> Vec<String> {
        self.command.split_whitespace().map(str::to_string).collect()
    }
}
