//! # dockerutil Runtime
//!
//! The container runtime as seen by dockerutil: list running containers,
//! inspect labels and health, exec a command and stream its output, restart,
//! and subscribe to container lifecycle events.
//!
//! [`ContainerRuntime`] is the seam; [`DockerRuntime`] implements it over the
//! Docker Engine API. With the `mock` feature, [`mock::MockRuntime`] provides
//! an in-memory implementation for tests.

pub mod docker;
pub mod error;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use docker::DockerRuntime;
pub use error::{RuntimeError, RuntimeResult};
pub use traits::{ContainerRuntime, EventStream, ExecSession, LineStream};
pub use types::{ContainerMetadata, EventAction, EventType, HealthStatus, LifecycleEvent};
