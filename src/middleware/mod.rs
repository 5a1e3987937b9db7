//! Middleware components
//!
//! Cross-cutting request policies applied in front of services.

pub mod rate_limit;

pub use rate_limit::{RateLimitConfig, RateLimiter};
