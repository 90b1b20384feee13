//! Container metadata and lifecycle event types.

use std::collections::HashMap;

/// Container health as reported by its healthcheck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthStatus {
    /// No healthcheck configured.
    #[default]
    None,
    Starting,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Parse the engine's textual status. Anything unknown maps to `None`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "starting" => HealthStatus::Starting,
            "healthy" => HealthStatus::Healthy,
            "unhealthy" => HealthStatus::Unhealthy,
            _ => HealthStatus::None,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::None => write!(f, "none"),
            HealthStatus::Starting => write!(f, "starting"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Read-only view of a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerMetadata {
    pub id: String,
    /// Container name without the leading slash.
    pub name: Option<String>,
    pub labels: HashMap<String, String>,
    pub health: HealthStatus,
}

impl ContainerMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    /// Value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Kind of object an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Container,
    Other(String),
}

/// What happened to the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Start,
    Die,
    Stop,
    HealthStatus(HealthStatus),
    Other(String),
}

impl EventAction {
    /// Interpret an engine action string.
    ///
    /// Health transitions arrive either as `health_status` with the status in
    /// the `health_status` attribute, or as `health_status: <status>`.
    pub fn parse(action: &str, attributes: &HashMap<String, String>) -> Self {
        match action {
            "start" => EventAction::Start,
            "die" => EventAction::Die,
            "stop" => EventAction::Stop,
            "health_status" => EventAction::HealthStatus(
                attributes
                    .get("health_status")
                    .map(|s| HealthStatus::parse(s))
                    .unwrap_or_default(),
            ),
            other => match other.strip_prefix("health_status:") {
                Some(status) => EventAction::HealthStatus(HealthStatus::parse(status)),
                None => EventAction::Other(other.to_string()),
            },
        }
    }
}

/// One lifecycle event from the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub event_type: EventType,
    pub action: EventAction,
    /// ID of the object the event is about.
    pub actor_id: String,
    pub attributes: HashMap<String, String>,
}

impl LifecycleEvent {
    /// A container event.
    pub fn container(actor_id: impl Into<String>, action: EventAction) -> Self {
        Self {
            event_type: EventType::Container,
            action,
            actor_id: actor_id.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_container(&self) -> bool {
        self.event_type == EventType::Container
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
