//! Configuration validator for RTTI-Scanner
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, OutputConfig, ScannerConfig, TargetConfig};

/// Largest class name the scanner will read, in code units
const MAX_NAME_LEN: usize = 4096;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_target(&config.target)?;
        Self::validate_output(&config.output)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates decoder limits
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.max_name_len == 0 || scanner.max_name_len > MAX_NAME_LEN {
            return Err(ConfigError::Invalid(format!(
                "max_name_len must be between 1 and {}",
                MAX_NAME_LEN
            )));
        }

        // MSVC's own sanity range for numBaseClasses is [1, 24]
        if scanner.max_msvc_bases == 0 || scanner.max_msvc_bases > 24 {
            return Err(ConfigError::Invalid(
                "max_msvc_bases must be between 1 and 24".to_string(),
            ));
        }

        if scanner.max_itanium_bases == 0 {
            return Err(ConfigError::Invalid(
                "max_itanium_bases must be at least 1".to_string(),
            ));
        }

        if scanner.max_nodes == 0 {
            return Err(ConfigError::Invalid(
                "max_nodes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the target description
    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        target.width().map(|_| ())
    }

    /// Validates output configuration
    fn validate_output(output: &OutputConfig) -> Result<(), ConfigError> {
        output.style().map(|_| ())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
