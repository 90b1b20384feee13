//! Configuration schema.

use serde::{Deserialize, Serialize};

pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub docker: DockerConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub autoheal: AutohealConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Docker engine connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Engine address (`unix:///var/run/docker.sock`, `tcp://host:2375`).
    /// When unset, `DOCKER_HOST` or the platform default socket is used.
    #[serde(default)]
    pub host: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_docker_timeout")]
    pub timeout_secs: u64,

    /// Delay before resubscribing after the event stream drops.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_docker_timeout() -> u64 {
    120
}

fn default_reconnect_delay() -> u64 {
    5
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: None,
            timeout_secs: default_docker_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// What a producer does when the execution queue is at capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Wait until the executor frees a slot. Every firing eventually runs.
    #[default]
    Block,
    /// Discard the new task and count it as dropped.
    DropNewest,
}

/// Execution queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of queued tasks.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Behaviour when the queue is full.
    #[serde(default)]
    pub backpressure: BackpressurePolicy,
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            backpressure: BackpressurePolicy::default(),
        }
    }
}

/// Executor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on a single in-container command. Unset means a hung
    /// command holds the executor until it exits.
    #[serde(default)]
    pub exec_timeout_secs: Option<u64>,
}

/// Restart-on-unhealthy policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutohealConfig {
    /// Master switch; containers still have to opt in by label.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Grace period passed to the restart request.
    #[serde(default = "default_restart_timeout")]
    pub restart_timeout_secs: u64,
}

fn default_restart_timeout() -> u64 {
    10
}

impl Default for AutohealConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            restart_timeout_secs: default_restart_timeout(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily-rolling log files. Console only when unset.
    #[serde(default)]
    pub file_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file_dir: None,
        }
    }
}
