//! Configuration module
//!
//! Settings structures, loading from TOML files and environment
//! variables, and startup validation.

pub mod settings;
pub mod validation;

pub use settings::{
    AssistantConfig, AuthConfig, CampusConfig, DatabaseConfig, FeaturesConfig, LoggingConfig,
    RedisConfig, Settings, WeatherConfig,
};
