//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub weather: WeatherConfig,
    pub assistant: AssistantConfig,
    pub campus: CampusConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Identity provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    pub session_ttl_seconds: u64,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Weather API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    pub api_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub timeout_seconds: u64,
    pub refresh_minutes: u64,
}

/// AI assistant API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub max_prompts_per_minute: u32,
}

/// Campus identity configuration (display name, map embed query)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampusConfig {
    pub name: String,
    pub place_query: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub max_file_size: String,
    pub max_files: u32,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub google_sign_in: bool,
    pub assistant: bool,
    pub weather: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("SPARTANVILLE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SpartanvilleError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth: AuthConfig {
                api_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
                api_key: String::new(),
                timeout_seconds: 10,
                session_ttl_seconds: 3600,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/spartanville".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "spartanville:".to_string(),
                ttl_seconds: 3600,
            },
            weather: WeatherConfig {
                api_url: "https://api.open-meteo.com/v1/forecast".to_string(),
                latitude: 37.3394,
                longitude: -121.895,
                timezone: "America/Los_Angeles".to_string(),
                timeout_seconds: 10,
                refresh_minutes: 30,
            },
            assistant: AssistantConfig {
                api_url: "https://api.anthropic.com".to_string(),
                api_key: String::new(),
                model: "claude-3-haiku-20240307".to_string(),
                max_tokens: 1000,
                timeout_seconds: 30,
                max_prompts_per_minute: 10,
            },
            campus: CampusConfig {
                name: "San José State University".to_string(),
                place_query: "San José State University".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/spartanville".to_string(),
                max_file_size: "10MB".to_string(),
                max_files: 5,
            },
            features: FeaturesConfig {
                google_sign_in: true,
                assistant: true,
                weather: true,
            },
        }
    }
}
