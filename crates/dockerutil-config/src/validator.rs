//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{BackpressurePolicy, Config};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse into the first error, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_docker(config, &mut result);
        Self::validate_queue(config, &mut result);
        Self::validate_executor(config, &mut result);
        Self::validate_autoheal(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_docker(config: &Config, result: &mut ValidationResult) {
        if config.docker.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "docker.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if let Some(host) = &config.docker.host {
            let known = ["unix://", "tcp://", "http://", "https://"];
            if !known.iter().any(|scheme| host.starts_with(scheme)) {
                result.add_error(ValidationError::new(
                    "docker.host",
                    format!("unsupported address scheme: {}", host),
                ));
            }
        }
    }

    fn validate_queue(config: &Config, result: &mut ValidationResult) {
        if config.queue.capacity == 0 {
            result.add_error(ValidationError::new(
                "queue.capacity",
                "capacity must be greater than 0",
            ));
        }

        if config.queue.backpressure == BackpressurePolicy::DropNewest {
            result.add_warning(ValidationWarning::new(
                "queue.backpressure",
                "drop_newest discards cron firings while the queue is full",
            ));
        }
    }

    fn validate_executor(config: &Config, result: &mut ValidationResult) {
        match config.executor.exec_timeout_secs {
            Some(0) => result.add_error(ValidationError::new(
                "executor.exec_timeout_secs",
                "exec_timeout_secs must be greater than 0 when set",
            )),
            None => result.add_warning(ValidationWarning::new(
                "executor.exec_timeout_secs",
                "no exec timeout; a hung command stalls every queued job",
            )),
            Some(_) => {}
        }
    }

    fn validate_autoheal(config: &Config, result: &mut ValidationResult) {
        if config.autoheal.enabled && config.autoheal.restart_timeout_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "autoheal.restart_timeout_secs",
                "containers will be killed without a stop grace period",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        // Full directives like "dockerutil=debug" are left to EnvFilter.
        if !level.contains('=') && !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!("unknown log level: {}", config.logging.level),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
