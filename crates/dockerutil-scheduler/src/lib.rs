//! # dockerutil Scheduler
//!
//! In-process cron scheduler. Each registered job owns a tokio timer task
//! that sleeps until the next cron time point and then awaits the job's
//! callback. Jobs carry a name and a set of tags; [`CronScheduler::remove_by_tag`]
//! is the bulk removal primitive.
//!
//! Expressions may use the standard 5-field form (`min hour dom mon dow`) or
//! the 6-field form with a leading seconds field, the `@daily`-style
//! descriptors, or `@every <duration>`. See [`schedule::parse_schedule`].

pub mod error;
pub mod job;
pub mod schedule;
pub mod scheduler;

pub use error::SchedulerError;
pub use job::{CronJob, JobCallback, JobInfo};
pub use schedule::{Trigger, parse_schedule};
pub use scheduler::CronScheduler;

// Re-export CancellationToken for convenience
pub use tokio_util::sync::CancellationToken;
