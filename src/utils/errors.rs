//! Error handling for Spartanville
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the Spartanville application
#[derive(Error, Debug)]
pub enum SpartanvilleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Weather API error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Assistant API error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    #[error("Stale intent: superseded by sequence {newer_seq}")]
    StaleIntent { newer_seq: u64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Identity provider specific errors
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity API request failed: {0}")]
    RequestFailed(String),

    #[error("Identity API timeout")]
    Timeout,

    #[error("Invalid identity response: {0}")]
    InvalidResponse(String),

    #[error("Unknown email address")]
    EmailNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Email address already registered")]
    EmailExists,

    #[error("Google credential rejected: {0}")]
    InvalidIdpCredential(String),

    #[error("Identity service unavailable")]
    ServiceUnavailable,
}

/// Weather API specific errors
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Weather API request failed: {0}")]
    RequestFailed(String),

    #[error("Weather API timeout")]
    Timeout,

    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),

    #[error("Weather service unavailable")]
    ServiceUnavailable,
}

/// AI assistant API specific errors
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant API request failed: {0}")]
    RequestFailed(String),

    #[error("Assistant API timeout")]
    Timeout,

    #[error("Invalid assistant response: {0}")]
    InvalidResponse(String),

    #[error("Assistant response contained no text content")]
    EmptyResponse,

    #[error("Assistant service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Spartanville operations
pub type Result<T> = std::result::Result<T, SpartanvilleError>;

/// Result type alias for identity provider operations
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

/// Result type alias for weather operations
pub type WeatherResult<T> = std::result::Result<T, WeatherError>;

/// Result type alias for assistant operations
pub type AssistantResult<T> = std::result::Result<T, AssistantError>;

impl SpartanvilleError {
    /// Check if the error is recoverable by user retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpartanvilleError::Database(_) => false,
            SpartanvilleError::Migration(_) => false,
            SpartanvilleError::Identity(_) => true,
            SpartanvilleError::Weather(_) => true,
            SpartanvilleError::Assistant(_) => true,
            SpartanvilleError::Config(_) => false,
            SpartanvilleError::Unauthorized => false,
            SpartanvilleError::EventNotFound { .. } => false,
            SpartanvilleError::StaleIntent { .. } => false,
            SpartanvilleError::InvalidStateTransition { .. } => false,
            SpartanvilleError::Redis(_) => true,
            SpartanvilleError::Http(_) => true,
            SpartanvilleError::Serialization(_) => false,
            SpartanvilleError::Io(_) => true,
            SpartanvilleError::UrlParse(_) => false,
            SpartanvilleError::RateLimitExceeded => true,
            SpartanvilleError::InvalidInput(_) => false,
            SpartanvilleError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SpartanvilleError::Database(_) => ErrorSeverity::Critical,
            SpartanvilleError::Migration(_) => ErrorSeverity::Critical,
            SpartanvilleError::Config(_) => ErrorSeverity::Critical,
            SpartanvilleError::Unauthorized => ErrorSeverity::Warning,
            SpartanvilleError::RateLimitExceeded => ErrorSeverity::Warning,
            SpartanvilleError::StaleIntent { .. } => ErrorSeverity::Info,
            SpartanvilleError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
