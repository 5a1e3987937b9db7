//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{Result, SpartanvilleError};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_auth_config(&settings.auth)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_weather_config(&settings.weather)?;
    validate_logging_config(&settings.logging)?;

    if settings.features.assistant {
        validate_assistant_config(&settings.assistant)?;
    }

    Ok(())
}

/// Validate identity provider configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(SpartanvilleError::Config(
            "Identity provider API URL is required".to_string(),
        ));
    }

    if config.api_key.is_empty() {
        return Err(SpartanvilleError::Config(
            "Identity provider API key is required".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(SpartanvilleError::Config(
            "Identity provider timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SpartanvilleError::Config(
            "Database URL is required".to_string(),
        ));
    }

    if config.max_connections == 0 {
        return Err(SpartanvilleError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(SpartanvilleError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SpartanvilleError::Config(
            "Redis URL is required".to_string(),
        ));
    }

    Ok(())
}

/// Validate weather API configuration
fn validate_weather_config(config: &super::WeatherConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(SpartanvilleError::Config(
            "Weather API URL is required".to_string(),
        ));
    }

    if !(-90.0..=90.0).contains(&config.latitude) {
        return Err(SpartanvilleError::Config(
            "Campus latitude must be between -90 and 90".to_string(),
        ));
    }

    if !(-180.0..=180.0).contains(&config.longitude) {
        return Err(SpartanvilleError::Config(
            "Campus longitude must be between -180 and 180".to_string(),
        ));
    }

    if config.refresh_minutes == 0 {
        return Err(SpartanvilleError::Config(
            "Weather refresh interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate AI assistant configuration
fn validate_assistant_config(config: &super::AssistantConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(SpartanvilleError::Config(
            "Assistant API URL is required".to_string(),
        ));
    }

    if config.api_key.is_empty() {
        return Err(SpartanvilleError::Config(
            "Assistant API key is required when the assistant feature is enabled".to_string(),
        ));
    }

    if config.model.is_empty() {
        return Err(SpartanvilleError::Config(
            "Assistant model name is required".to_string(),
        ));
    }

    if config.max_tokens == 0 {
        return Err(SpartanvilleError::Config(
            "Assistant max_tokens must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    let level = config.level.to_lowercase();

    // EnvFilter directives like "info,sqlx=warn" are accepted as-is
    if !level.contains('=') && !level.contains(',') && !valid_levels.contains(&level.as_str()) {
        return Err(SpartanvilleError::Config(format!(
            "Invalid log level: {}",
            config.level
        )));
    }

    if config.file_path.is_empty() {
        return Err(SpartanvilleError::Config(
            "Log file path is required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.api_key = "test-key".to_string();
        settings.assistant.api_key = "test-key".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_auth_key_rejected() {
        let mut settings = valid_settings();
        settings.auth.api_key = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_connection_bounds_rejected() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 10;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let mut settings = valid_settings();
        settings.weather.latitude = 123.0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_assistant_key_only_required_when_enabled() {
        let mut settings = valid_settings();
        settings.assistant.api_key = String::new();
        assert!(validate_settings(&settings).is_err());

        settings.features.assistant = false;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = valid_settings();
        settings.logging.level = "loud".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
