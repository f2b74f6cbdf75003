//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DiscoveryConfig, LogOutput, LoggingConfig, RosterConfig};
use crate::error::ScanError;
use crate::patterns::validate_pattern;

/// Validates the entire configuration.
pub fn validate_config(config: &RosterConfig) -> ConfigResult<()> {
    validate_discovery_config(&config.discovery)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates discovery settings.
fn validate_discovery_config(discovery: &DiscoveryConfig) -> ConfigResult<()> {
    if discovery.batch_size == 0 {
        return Err(ConfigError::validation("Batch size must be greater than 0"));
    }

    if discovery.load_timeout_ms == Some(0) {
        return Err(ConfigError::validation("Load timeout must be greater than 0"));
    }

    if discovery.roots.iter().any(|root| root.as_os_str().is_empty()) {
        return Err(ConfigError::validation("Discovery roots must not be empty paths"));
    }

    if discovery.include.is_empty() {
        return Err(ConfigError::validation("At least one include pattern is required"));
    }

    validate_patterns("discovery.include", &discovery.include)?;
    validate_patterns("discovery.exclude", &discovery.exclude)?;

    Ok(())
}

fn validate_patterns(field: &'static str, patterns: &[String]) -> ConfigResult<()> {
    for pattern in patterns {
        validate_pattern(pattern).map_err(|err| match err {
            ScanError::Pattern { pattern, reason } => ConfigError::InvalidPattern { field, pattern, reason },
            other => ConfigError::validation(other.to_string()),
        })?;
    }
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is 'file'",
        ));
    }

    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter targets must not be empty"));
    }

    Ok(())
}
