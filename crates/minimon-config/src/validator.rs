//! Configuration validation.

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

use minimon_protocols::is_valid_name;

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

    /// Collapse errors into a single [`ConfigError::Validation`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.errors.is_empty() {
            return Ok(self.warnings);
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Validation(joined))
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

        Self::validate_alert(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_notifiers(config, &mut result);
        Self::validate_providers(config, &mut result);

        result
    }

    fn validate_alert(config: &Config, result: &mut ValidationResult) {
        let alert = &config.alert;
        if alert.healthy_threshold == 0 {
            result.add_error(ValidationError::new(
                "alert.healthy_threshold",
                "healthy_threshold must be greater than 0",
            ));
        }
        if alert.unhealthy_threshold == 0 {
            result.add_error(ValidationError::new(
                "alert.unhealthy_threshold",
                "unhealthy_threshold must be greater than 0",
            ));
        }
        if alert.grouping.window.is_zero() {
            result.add_error(ValidationError::new(
                "alert.grouping.window",
                "grouping window must be greater than 0",
            ));
        }
        if alert.failure_reminder_count > 0 && alert.failure_reminder.is_zero() {
            result.add_warning(ValidationWarning::new(
                "alert.failure_reminder",
                "failure_reminder is 0, reminders will fire on every failing scrape",
            ));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.workers == 0 {
            result.add_error(ValidationError::new(
                "scheduler.workers",
                "workers must be greater than 0",
            ));
        }
    }

    fn validate_notifiers(config: &Config, result: &mut ValidationResult) {
        if config.notifiers.is_empty() {
            result.add_warning(ValidationWarning::new(
                "notifiers",
                "No notifiers configured, alerts will only be logged",
            ));
        }
        for (name, notifier) in &config.notifiers {
            if !is_valid_name(name) {
                result.add_error(ValidationError::new(
                    format!("notifiers.{}", name),
                    "name may only contain letters, digits, '_' and '-'",
                ));
            }
            if notifier.notifier_type.is_empty() {
                result.add_error(ValidationError::new(
                    format!("notifiers.{}.type", name),
                    "type cannot be empty",
                ));
            }
            if !notifier.params.is_object() {
                result.add_error(ValidationError::new(
                    format!("notifiers.{}.params", name),
                    "params must be a map",
                ));
            }
        }
    }

    fn validate_providers(config: &Config, result: &mut ValidationResult) {
        for (name, provider) in &config.providers {
            if !is_valid_name(name) {
                result.add_error(ValidationError::new(
                    format!("providers.{}", name),
                    "name may only contain letters, digits, '_' and '-'",
                ));
            }
            if provider.provider_type.is_empty() {
                result.add_error(ValidationError::new(
                    format!("providers.{}.type", name),
                    "type cannot be empty",
                ));
            }
            if provider.scrape_interval.is_zero() {
                result.add_error(ValidationError::new(
                    format!("providers.{}.scrape_interval", name),
                    "scrape_interval must be greater than 0",
                ));
            }
            if !provider.params.is_object() {
                result.add_error(ValidationError::new(
                    format!("providers.{}.params", name),
                    "params must be a map",
                ));
            }
        }
    }
}
