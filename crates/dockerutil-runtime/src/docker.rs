//! Docker Engine implementation of [`ContainerRuntime`].

use std::collections::HashMap;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, LogOutput, RestartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{EventMessage, EventMessageTypeEnum, HealthStatusEnum};
use bollard::system::EventsOptions;
use bollard::{API_DEFAULT_VERSION, Docker};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use dockerutil_config::DockerConfig;

use crate::error::{RuntimeError, RuntimeResult};
use crate::traits::{ContainerRuntime, EventStream, ExecSession, LineStream};
use crate::types::{ContainerMetadata, EventAction, EventType, HealthStatus, LifecycleEvent};

/// Docker Engine client.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect and ping the engine. Failure here is fatal for the daemon.
    pub async fn connect(config: &DockerConfig) -> RuntimeResult<Self> {
        let timeout = config.timeout_secs;
        let docker = match config.host.as_deref() {
            None => Docker::connect_with_local_defaults(),
            Some(host) if host.starts_with("unix://") => {
                Docker::connect_with_socket(host, timeout, API_DEFAULT_VERSION)
            }
            Some(host) => Docker::connect_with_http(host, timeout, API_DEFAULT_VERSION),
        }
        .map_err(|e| RuntimeError::Connect(e.to_string()))?
        .with_timeout(Duration::from_secs(timeout));

        docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Connect(e.to_string()))?;

        info!(
            host = config.host.as_deref().unwrap_or("default"),
            "Connected to Docker engine"
        );
        Ok(Self { docker })
    }

    /// Wrap an existing client.
    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> RuntimeResult<Vec<String>> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    async fn inspect(&self, container_id: &str) -> RuntimeResult<ContainerMetadata> {
        let response = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?;

        let labels = response
            .config
            .and_then(|c| c.labels)
            .unwrap_or_default();
        let health = response
            .state
            .and_then(|s| s.health)
            .and_then(|h| h.status)
            .map(health_from_engine)
            .unwrap_or_default();

        Ok(ContainerMetadata {
            id: response.id.unwrap_or_else(|| container_id.to_string()),
            name: response
                .name
                .map(|n| n.trim_start_matches('/').to_string()),
            labels,
            health,
        })
    }

    async fn exec(&self, container_id: &str, argv: Vec<String>) -> RuntimeResult<ExecSession> {
        let options = CreateExecOptions {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(argv),
            ..Default::default()
        };

        let created = self
            .docker
            .create_exec(container_id, options)
            .await
            .map_err(|e| RuntimeError::ExecCreate {
                container_id: container_id.to_string(),
                message: e.to_string(),
            })?;

        let started = self
            .docker
            .start_exec(&created.id, None)
            .await
            .map_err(|e| RuntimeError::ExecAttach {
                container_id: container_id.to_string(),
                message: e.to_string(),
            })?;

        match started {
            StartExecResults::Attached { output, .. } => {
                debug!(container_id, exec_id = %created.id, "Attached to exec");
                Ok(ExecSession {
                    exec_id: created.id,
                    output: output_lines(output),
                })
            }
            StartExecResults::Detached => Err(RuntimeError::ExecAttach {
                container_id: container_id.to_string(),
                message: "exec started detached".to_string(),
            }),
        }
    }

    async fn exec_exit_code(&self, exec_id: &str) -> RuntimeResult<Option<i64>> {
        let inspect = self.docker.inspect_exec(exec_id).await?;
        Ok(inspect.exit_code)
    }

    async fn restart(&self, container_id: &str, timeout_secs: u64) -> RuntimeResult<()> {
        let options = RestartContainerOptions {
            t: timeout_secs as isize,
        };
        self.docker
            .restart_container(container_id, Some(options))
            .await?;
        Ok(())
    }

    /// The engine request is only sent on first poll, so the stream is
    /// anchored at the call time with `since`: anything that happens between
    /// this call and the first poll is replayed by the engine.
    fn events(&self) -> EventStream {
        let docker = self.docker.clone();
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        let options = EventsOptions::<String> {
            since: Some(engine_timestamp(Utc::now())),
            filters,
            ..Default::default()
        };

        Box::pin(try_stream! {
            let events = docker.events(Some(options));
            futures::pin_mut!(events);
            while let Some(message) = events.next().await {
                let message = message.map_err(|e| RuntimeError::EventStream(e.to_string()))?;
                yield lifecycle_event(message);
            }
        })
    }
}

/// `seconds.nanoseconds`, the timestamp form the events endpoint accepts.
fn engine_timestamp(at: DateTime<Utc>) -> String {
    format!("{}.{:09}", at.timestamp(), at.timestamp_subsec_nanos())
}

fn health_from_engine(status: HealthStatusEnum) -> HealthStatus {
    match status {
        HealthStatusEnum::STARTING => HealthStatus::Starting,
        HealthStatusEnum::HEALTHY => HealthStatus::Healthy,
        HealthStatusEnum::UNHEALTHY => HealthStatus::Unhealthy,
        _ => HealthStatus::None,
    }
}

fn lifecycle_event(message: EventMessage) -> LifecycleEvent {
    let event_type = match message.typ {
        Some(EventMessageTypeEnum::CONTAINER) => EventType::Container,
        Some(other) => EventType::Other(format!("{:?}", other).to_lowercase()),
        None => EventType::Other(String::new()),
    };
    let (actor_id, attributes) = message
        .actor
        .map(|a| (a.id.unwrap_or_default(), a.attributes.unwrap_or_default()))
        .unwrap_or_default();
    let action = EventAction::parse(message.action.as_deref().unwrap_or_default(), &attributes);

    LifecycleEvent {
        event_type,
        action,
        actor_id,
        attributes,
    }
}

/// Re-chunk raw exec output into lines.
fn output_lines<S>(output: S) -> LineStream
where
    S: Stream<Item = Result<LogOutput, bollard::errors::Error>> + Send + Unpin + 'static,
{
    Box::pin(try_stream! {
        let mut output = output;
        let mut buffer = String::new();
        while let Some(chunk) = output.next().await {
            let chunk = chunk.map_err(RuntimeError::from)?;
            buffer.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
            for line in drain_lines(&mut buffer) {
                yield line;
            }
        }
        if !buffer.is_empty() {
            yield std::mem::take(&mut buffer);
        }
    })
}

/// Remove every complete line from `buffer`, leaving any trailing partial line.
pub(crate) fn drain_lines(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line = buffer[..pos].trim_end_matches('\r').to_string();
        buffer.drain(..=pos);
        lines.push(line);
    }
    lines
}
