//! Session state management
//!
//! Redis-backed persistence for authenticated sessions.

pub mod session;

pub use session::{AuthSession, SessionStorage};
