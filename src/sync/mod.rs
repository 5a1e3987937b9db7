//! Event synchronization
//!
//! Reconciles optimistic local attendance state with the remote event
//! store under concurrent multi-user edits: intents, the reconciler state
//! machine, the pure view projector, and the engine task that drives them.

pub mod engine;
pub mod intent;
pub mod projector;
pub mod reconciler;

pub use engine::SyncEngine;
pub use intent::{AttendanceIntent, AttendanceMutation, IntentHandle, IntentStatus};
pub use projector::project;
pub use reconciler::{AckDisposition, AttendanceReconciler, DeleteDisposition, EventView};
