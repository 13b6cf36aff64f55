//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

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

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
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
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_model(config, &mut result);
        Self::validate_retry(config, &mut result);
        Self::validate_chunking(config, &mut result);
        Self::validate_store(config, &mut result);

        Ok(result)
    }

    fn validate_model(config: &Config, result: &mut ValidationResult) {
        let url = &config.model.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "model.base_url",
                "base_url must start with http:// or https://",
            ));
        }

        if config.model.model.trim().is_empty() {
            result.add_error(ValidationError::new("model.model", "Model name cannot be empty"));
        }

        if config.model.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "model.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }

        if let Some(temperature) = config.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                result.add_error(ValidationError::new(
                    "model.temperature",
                    "temperature must be between 0.0 and 2.0",
                ));
            }
        }
    }

    fn validate_retry(config: &Config, result: &mut ValidationResult) {
        if config.retry.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "retry.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }

        if config.retry.max_attempts > 10 {
            result.add_warning(ValidationWarning::new(
                "retry.max_attempts",
                "max_attempts is very high (>10), failing calls will take a long time to surface",
            ));
        }

        if config.retry.backoff_multiplier < 1.0 {
            result.add_error(ValidationError::new(
                "retry.backoff_multiplier",
                "backoff_multiplier must be at least 1.0",
            ));
        }

        if config.retry.max_delay_ms < config.retry.initial_delay_ms {
            result.add_warning(ValidationWarning::new(
                "retry.max_delay_ms",
                "max_delay_ms is below initial_delay_ms, every retry will use max_delay_ms",
            ));
        }
    }

    fn validate_chunking(config: &Config, result: &mut ValidationResult) {
        if config.chunking.budget_chars == 0 {
            result.add_error(ValidationError::new(
                "chunking.budget_chars",
                "budget_chars must be greater than 0",
            ));
        } else if config.chunking.budget_chars < 500 {
            result.add_warning(ValidationWarning::new(
                "chunking.budget_chars",
                "budget_chars is very low (<500), long pages will need many model calls",
            ));
        }

        if config.chunking.max_resummarize_passes == 0 {
            result.add_warning(ValidationWarning::new(
                "chunking.max_resummarize_passes",
                "re-summarization disabled, oversized summaries will be cut at the budget",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        if !config.store.enabled {
            return;
        }

        if config.store.ttl_hours == 0 {
            result.add_error(ValidationError::new(
                "store.ttl_hours",
                "ttl_hours must be greater than 0",
            ));
        }

        if config.store.sweep_interval_hours == 0 {
            result.add_error(ValidationError::new(
                "store.sweep_interval_hours",
                "sweep_interval_hours must be greater than 0",
            ));
        }

        if config.store.sweep_interval_hours > config.store.ttl_hours {
            result.add_warning(ValidationWarning::new(
                "store.sweep_interval_hours",
                "sweep interval exceeds the TTL, expired records may linger",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
