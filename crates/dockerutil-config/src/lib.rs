//! # dockerutil Config
//!
//! TOML configuration for the dockerutil daemon: Docker connection, execution
//! queue sizing and backpressure, executor limits, autoheal and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
