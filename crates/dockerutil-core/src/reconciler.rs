//! Keeps registered jobs in step with running containers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dockerutil_runtime::{
    ContainerRuntime, EventAction, EventStream, HealthStatus, LifecycleEvent, RuntimeResult,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::autoheal::AutohealPolicy;
use crate::error::DaemonError;
use crate::labels::derive_jobs;
use crate::registry::{JobRegistry, Registration};

/// Lifecycle reconciler.
///
/// Consumes the startup snapshot and then live container events, one event
/// at a time, driving job derivation, the registry and autoheal. Inspect
/// failures abandon that container's transition and processing continues.
pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<JobRegistry>,
    autoheal: AutohealPolicy,
    reconnect_delay: Duration,
}

impl Reconciler {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<JobRegistry>,
        autoheal: AutohealPolicy,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            runtime,
            registry,
            autoheal,
            reconnect_delay,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Inspect a container, derive its jobs and register them.
    ///
    /// Shared by the snapshot and `start` paths.
    pub async fn register_container(&self, container_id: &str) -> Option<Registration> {
        let metadata = match self.runtime.inspect(container_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(container_id, "Failed to inspect container: {}", e);
                return None;
            }
        };

        let jobs = derive_jobs(container_id, &metadata.labels);
        let registration = self.registry.register_container(container_id, &jobs);
        if !jobs.is_empty() {
            info!(
                container_id,
                name = metadata.name.as_deref().unwrap_or(""),
                registered = registration.registered.len(),
                failed = registration.failed,
                "Registered cron jobs for container"
            );
        }
        Some(registration)
    }

    /// Remove every job of a container.
    pub fn unregister_container(&self, container_id: &str) -> usize {
        self.registry.remove_all_for_container(container_id)
    }

    /// Register every running container and untrack the ones that are gone.
    ///
    /// Returns the number of running containers.
    pub async fn sync_running(&self) -> RuntimeResult<usize> {
        let running = self.runtime.list_running().await?;
        let running_set: HashSet<&str> = running.iter().map(String::as_str).collect();

        for stale in self
            .registry
            .tracked_containers()
            .into_iter()
            .filter(|id| !running_set.contains(id.as_str()))
        {
            debug!(container_id = %stale, "Container no longer running");
            self.unregister_container(&stale);
        }

        for container_id in &running {
            self.register_container(container_id).await;
        }
        Ok(running.len())
    }

    /// Apply one lifecycle event.
    pub async fn handle_event(&self, event: &LifecycleEvent) {
        if !event.is_container() {
            trace!(event_type = ?event.event_type, "Ignoring non-container event");
            return;
        }

        let container_id = event.actor_id.as_str();
        match &event.action {
            EventAction::Start => {
                info!(container_id, "Container started");
                self.register_container(container_id).await;
            }
            EventAction::Die | EventAction::Stop => {
                info!(container_id, "Container stopped");
                self.unregister_container(container_id);
            }
            EventAction::HealthStatus(HealthStatus::Unhealthy) => {
                self.autoheal.handle_unhealthy(container_id).await;
            }
            EventAction::HealthStatus(status) => {
                trace!(container_id, %status, "Ignoring health status");
            }
            EventAction::Other(action) => {
                trace!(container_id, action = %action, "Ignoring container event");
            }
        }
    }

    /// Subscribe to events, then take the startup snapshot.
    ///
    /// Subscribing first means nothing between the listing and the
    /// subscription is missed; duplicates are absorbed by re-registration.
    pub async fn start(&self) -> Result<EventStream, DaemonError> {
        let events = self.runtime.events();
        let running = self
            .sync_running()
            .await
            .map_err(DaemonError::Snapshot)?;
        info!("Startup snapshot complete ({} running containers)", running);
        Ok(events)
    }

    /// Process events until `cancel` fires, resubscribing whenever the
    /// stream fails or ends.
    pub async fn run_events(&self, mut events: EventStream, cancel: CancellationToken) {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.handle_event(&event) => {}
                    }
                    continue;
                }
                Some(Err(e)) => warn!("Event stream failed: {}", e),
                None => warn!("Event stream ended"),
            }

            match self.resubscribe(&cancel).await {
                Some(stream) => events = stream,
                None => break,
            }
        }
        info!("Reconciler stopped");
    }

    /// [`start`](Self::start) followed by [`run_events`](Self::run_events).
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), DaemonError> {
        let events = self.start().await?;
        self.run_events(events, cancel).await;
        Ok(())
    }

    /// Wait, subscribe again and resync. `None` once cancelled.
    async fn resubscribe(&self, cancel: &CancellationToken) -> Option<EventStream> {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }

            let events = self.runtime.events();
            match self.sync_running().await {
                Ok(running) => {
                    info!("Event stream resubscribed, resynced {} containers", running);
                    return Some(events);
                }
                Err(e) => warn!("Resync after event stream loss failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
