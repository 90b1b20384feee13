//! # dockerutil Core
//!
//! Label-driven cron jobs for Docker containers.
//!
//! Containers declare jobs through labels (`dockerutil.cron.<task>.spec`,
//! `.cmd` and the bare `dockerutil.cron.<task>` run-now toggle). The
//! [`Reconciler`] keeps the [`JobRegistry`] in step with running containers,
//! scheduled firings flow through the execution queue to a single serial
//! executor, and unhealthy containers that opt in via `dockerutil.autoheal`
//! are restarted.

pub mod autoheal;
pub mod error;
pub mod exec_handler;
pub mod job;
pub mod labels;
pub mod reconciler;
pub mod registry;
pub mod service;

pub use autoheal::{AutohealOutcome, AutohealPolicy};
pub use error::{DaemonError, JobError};
pub use exec_handler::{ContainerExecHandler, EXEC_LOG_TARGET};
pub use job::JobDefinition;
pub use labels::{AUTOHEAL_LABEL, autoheal_enabled, derive_jobs};
pub use reconciler::Reconciler;
pub use registry::{JobRegistry, Registration};
pub use service::Service;
