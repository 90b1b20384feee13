//! Container label keys and job derivation.

use std::collections::{BTreeSet, HashMap};

use crate::job::JobDefinition;

/// Prefix shared by every cron label.
pub const CRON_LABEL_PREFIX: &str = "dockerutil.cron.";

/// Attribute holding the cron expression.
pub const SPEC_ATTRIBUTE: &str = "spec";

/// Attribute holding the command line.
pub const CMD_ATTRIBUTE: &str = "cmd";

/// Opt-in label for restart-on-unhealthy.
pub const AUTOHEAL_LABEL: &str = "dockerutil.autoheal";

/// Literal value that enables a boolean label. Compared case-sensitively.
pub const LABEL_TRUE: &str = "true";

/// Derive the job set of one container from its labels.
///
/// Recognized keys are `dockerutil.cron.<task>` and
/// `dockerutil.cron.<task>.<attribute>`; anything with more or fewer
/// segments is ignored. Each distinct task yields one definition, sorted by
/// task name. Missing `.spec` or `.cmd` values become empty strings and are
/// rejected later by [`JobDefinition::validate`].
pub fn derive_jobs(container_id: &str, labels: &HashMap<String, String>) -> Vec<JobDefinition> {
    let task_names: BTreeSet<&str> = labels.keys().filter_map(|key| task_name(key)).collect();

    task_names
        .into_iter()
        .map(|task| {
            let attribute = |name: &str| {
                labels
                    .get(&format!("{}{}.{}", CRON_LABEL_PREFIX, task, name))
                    .cloned()
                    .unwrap_or_default()
            };
            let toggle = labels.get(&format!("{}{}", CRON_LABEL_PREFIX, task));

            JobDefinition {
                container_id: container_id.to_string(),
                task_name: task.to_string(),
                cron_spec: attribute(SPEC_ATTRIBUTE),
                command: attribute(CMD_ATTRIBUTE),
                run_immediately: toggle.is_some_and(|v| v == LABEL_TRUE),
            }
        })
        .collect()
}

/// Whether a container opted in to autoheal.
pub fn autoheal_enabled(labels: &HashMap<String, String>) -> bool {
    labels.get(AUTOHEAL_LABEL).is_some_and(|v| v == LABEL_TRUE)
}

/// Task segment of a cron label key, if the key is well formed.
fn task_name(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(CRON_LABEL_PREFIX)?;
    let mut segments = rest.split('.');
    let task = segments.next()?;
    let attribute = segments.next();

    if task.is_empty() || segments.next().is_some() {
        return None;
    }
    match attribute {
        Some("") => None,
        _ => Some(task),
    }
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
