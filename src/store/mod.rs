//! Remote event store abstraction
//!
//! The event directory lives in a remote document store that pushes live
//! snapshots of the whole collection and supports atomic per-field updates.
//! This module defines the consumed capability set plus the two
//! implementations: PostgreSQL-backed for production and in-memory for
//! tests.

pub mod memory;
pub mod postgres;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::models::{Event, ValidatedEvent};
use crate::utils::errors::Result;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// A complete replacement push of the collection's current documents,
/// in arrival order.
pub type Snapshot = Vec<Event>;

type SnapshotStream = Pin<Box<dyn Stream<Item = Snapshot> + Send>>;

/// Counter fields eligible for atomic increment/decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    AttendanceCount,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::AttendanceCount => "attendance_count",
        }
    }
}

/// A live feed of collection snapshots.
///
/// The feed stays open until released. Dropping the subscription also
/// severs it, but callers that are done listening should call [`release`]
/// so the intent is explicit.
///
/// [`release`]: Subscription::release
pub struct Subscription {
    stream: SnapshotStream,
    feeder: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(stream: SnapshotStream, feeder: Option<JoinHandle<()>>) -> Self {
        Self { stream, feeder }
    }

    /// Wait for the next snapshot; `None` once the feed has ended
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.stream.next().await
    }

    /// Release the subscription, stopping the snapshot feed
    pub fn release(mut self) {
        if let Some(handle) = self.feeder.take() {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.feeder.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("feeder", &self.feeder.is_some())
            .finish_non_exhaustive()
    }
}

/// Capability set consumed from the remote event store.
///
/// `increment_field` and `set_member` are atomic and commutative with
/// concurrent calls from other clients; `create` assigns the document id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Open a live snapshot feed for the events collection
    async fn subscribe(&self) -> Result<Subscription>;

    /// Create a new event document, returning the assigned id
    async fn create(&self, event: ValidatedEvent, created_by: Option<&str>) -> Result<String>;

    /// Delete an event document
    async fn delete(&self, id: &str) -> Result<()>;

    /// Atomically adjust a counter field by `delta`
    async fn increment_field(&self, id: &str, field: CounterField, delta: i64) -> Result<()>;

    /// Atomically add or remove a user from the event's attendee set
    async fn set_member(&self, id: &str, user_id: &str, present: bool) -> Result<()>;
}
