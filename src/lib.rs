//! Spartanville campus community service
//!
//! A backend service for a university community application: a campus
//! events directory with real-time attendance synchronization, email and
//! Google sign-in, campus weather, and an AI assistant. This library
//! provides the event store abstraction, the attendance synchronization
//! engine, and the supporting services.

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SpartanvilleError};

// Re-export main components for easy access
pub use services::ServiceFactory;
pub use store::{EventStore, MemoryEventStore, PgEventStore};
pub use sync::{AttendanceReconciler, SyncEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
