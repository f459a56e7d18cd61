//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Intervals above this still work but are almost certainly a typo.
const LONG_INTERVAL_SECS: u64 = 3600;

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

        Self::validate_daemon(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_daemon(config: &Config, result: &mut ValidationResult) {
        let daemon = &config.daemon;

        if daemon.tick_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "daemon.tick_interval_secs",
                "tick_interval_secs must be greater than 0",
            ));
        }

        if daemon.tick_interval_secs > LONG_INTERVAL_SECS {
            result.add_warning(ValidationWarning::new(
                "daemon.tick_interval_secs",
                format!(
                    "tick interval of {}s is over an hour",
                    daemon.tick_interval_secs
                ),
            ));
        }

        if daemon.log_file.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "daemon.log_file",
                "log_file cannot be empty",
            ));
        } else if daemon.log_file.is_relative() {
            result.add_warning(ValidationWarning::new(
                "daemon.log_file",
                "log_file is relative and will be resolved against the launch directory",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, VALID_LEVELS
                ),
            ));
        }

        if let Some(dir) = &config.logging.dir {
            if dir.is_file() {
                result.add_error(ValidationError::new(
                    "logging.dir",
                    format!("{} is a file, expected a directory", dir.display()),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
