//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the Spartanville application.

use crate::config::LoggingConfig;
use crate::utils::errors::Result;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "spartanville.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log authentication events with structured data
pub fn log_auth_event(user_id: Option<&str>, event: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        event = event,
        details = details,
        "Auth event"
    );
}

/// Log event directory actions (create/delete/attendance)
pub fn log_event_action(event_id: &str, action: &str, user_id: Option<&str>, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log notification deliveries
pub fn log_notification(title: &str, destructive: bool) {
    if destructive {
        warn!(title = title, "Destructive notification delivered");
    } else {
        debug!(title = title, "Notification delivered");
    }
}
