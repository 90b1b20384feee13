//! Process-lifetime wiring of the daemon's components.

use std::sync::Arc;
use std::time::Duration;

use dockerutil_config::Config;
use dockerutil_runtime::{ContainerRuntime, DockerRuntime};
use dockerutil_scheduler::CronScheduler;
use dockerutil_workqueue::{ExecutionQueue, Executor};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::autoheal::AutohealPolicy;
use crate::error::DaemonError;
use crate::exec_handler::ContainerExecHandler;
use crate::reconciler::Reconciler;
use crate::registry::JobRegistry;

/// The running daemon.
///
/// Owns the scheduler, the execution queue and the two long-lived loops
/// (executor and reconciler). Everything shares one cancellation token.
pub struct Service {
    scheduler: Arc<CronScheduler>,
    queue: Arc<ExecutionQueue>,
    registry: Arc<JobRegistry>,
    executor: Arc<Executor>,
    reconciler: Arc<Reconciler>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Service {
    /// Connect to the Docker engine described by `config.docker`.
    pub async fn connect(config: &Config) -> Result<Self, DaemonError> {
        let runtime = DockerRuntime::connect(&config.docker).await?;
        Ok(Self::with_runtime(config, Arc::new(runtime)))
    }

    /// Build the service over an existing runtime.
    pub fn with_runtime(config: &Config, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let scheduler = Arc::new(CronScheduler::new());
        let queue = Arc::new(ExecutionQueue::new(&config.queue));
        let registry = Arc::new(JobRegistry::new(scheduler.clone(), queue.clone()));

        let handler = ContainerExecHandler::new(runtime.clone(), registry.clone())
            .with_timeout(config.executor.exec_timeout_secs.map(Duration::from_secs));
        let executor = Arc::new(Executor::new(queue.clone(), Arc::new(handler)));

        let autoheal = AutohealPolicy::new(runtime.clone(), &config.autoheal);
        let reconciler = Arc::new(Reconciler::new(
            runtime,
            registry.clone(),
            autoheal,
            Duration::from_secs(config.docker.reconnect_delay_secs),
        ));

        Self {
            scheduler,
            queue,
            registry,
            executor,
            reconciler,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Start the executor, the scheduler and the reconciler.
    ///
    /// # Errors
    ///
    /// `Snapshot` if the running containers cannot be listed.
    pub async fn start(&mut self) -> Result<(), DaemonError> {
        let executor = self.executor.clone();
        let cancel = self.cancel.clone();
        self.tasks
            .push(tokio::spawn(async move { executor.run(cancel).await }));

        self.scheduler.start();

        let events = match self.reconciler.start().await {
            Ok(events) => events,
            Err(e) => {
                self.cancel.cancel();
                return Err(e);
            }
        };
        let reconciler = self.reconciler.clone();
        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            reconciler.run_events(events, cancel).await
        }));

        info!(
            "dockerutil started, tracking {} containers",
            self.registry.tracked_containers().len()
        );
        Ok(())
    }

    /// Token that stops the service when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<ExecutionQueue> {
        &self.queue
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Cancel both loops, drop every timer and wait for the loops to exit.
    /// Queued tasks are discarded.
    pub async fn shutdown(self) -> Result<(), DaemonError> {
        info!("Shutting down dockerutil");
        self.cancel.cancel();
        self.scheduler.shutdown();

        let mut result = Ok(());
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Background task failed: {}", e);
                result = Err(DaemonError::Join(e.to_string()));
            }
        }
        info!("dockerutil stopped ({} queued tasks discarded)", self.queue.len());
        result
    }
}
