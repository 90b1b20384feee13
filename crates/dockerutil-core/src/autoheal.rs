//! Restart-on-unhealthy policy.

use std::sync::Arc;

use dockerutil_config::AutohealConfig;
use dockerutil_runtime::ContainerRuntime;
use tracing::{debug, error, info};

use crate::labels::autoheal_enabled;

/// What the policy did for one unhealthy report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutohealOutcome {
    /// Policy switched off in configuration.
    Disabled,
    /// Container does not carry the opt-in label.
    NotOptedIn,
    /// Exactly one restart request was issued.
    Restarted,
    /// Inspect or restart failed.
    Failed,
}

pub struct AutohealPolicy {
    runtime: Arc<dyn ContainerRuntime>,
    enabled: bool,
    restart_timeout_secs: u64,
}

impl AutohealPolicy {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: &AutohealConfig) -> Self {
        Self {
            runtime,
            enabled: config.enabled,
            restart_timeout_secs: config.restart_timeout_secs,
        }
    }

    /// Restart `container_id` if it opted in. Job registration is untouched;
    /// the restarted container reports its own `start`.
    pub async fn handle_unhealthy(&self, container_id: &str) -> AutohealOutcome {
        if !self.enabled {
            debug!(container_id, "Autoheal disabled, ignoring unhealthy container");
            return AutohealOutcome::Disabled;
        }

        let metadata = match self.runtime.inspect(container_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(container_id, "Failed to inspect unhealthy container: {}", e);
                return AutohealOutcome::Failed;
            }
        };

        if !autoheal_enabled(&metadata.labels) {
            debug!(container_id, "Container is unhealthy but not opted in to autoheal");
            return AutohealOutcome::NotOptedIn;
        }

        info!(container_id, "Container is unhealthy, restarting");
        match self
            .runtime
            .restart(container_id, self.restart_timeout_secs)
            .await
        {
            Ok(()) => {
                info!(container_id, "Container restarted successfully");
                AutohealOutcome::Restarted
            }
            Err(e) => {
                error!(container_id, "Failed to restart container: {}", e);
                AutohealOutcome::Failed
            }
        }
    }
}
