//! # dockerutil Work Queue
//!
//! Decouples cron firings from in-container execution.
//!
//! ## Features
//!
//! - Bounded FIFO queue with configurable backpressure
//! - Single serial executor driven by a [`TaskHandler`]
//! - Cooperative shutdown through a `CancellationToken`

pub mod error;
pub mod executor;
pub mod queue;
pub mod task;

pub use error::QueueError;
pub use executor::{Executor, TaskHandler};
pub use queue::ExecutionQueue;
pub use task::CronJobTask;
