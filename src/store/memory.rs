//! In-memory event store
//!
//! Reference implementation of [`EventStore`] used by the test suite and
//! as an executable model of the store contract. Snapshots are fanned out
//! through a watch channel, so every subscriber receives the current
//! collection immediately and a fresh full-replace snapshot after each
//! mutation.
//!
//! Mutation faults can be injected with [`MemoryEventStore::fail_next_operations`]
//! to drive rollback paths in tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use crate::models::{Event, ValidatedEvent};
use crate::store::{CounterField, EventStore, Snapshot, Subscription};
use crate::utils::errors::{Result, SpartanvilleError};
use crate::utils::helpers::generate_uuid;

#[derive(Debug)]
struct Inner {
    events: Vec<Event>,
    fail_next: u32,
}

#[derive(Debug, Clone)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<Inner>>,
    tx: Arc<watch::Sender<Snapshot>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                events: Vec::new(),
                fail_next: 0,
            })),
            tx: Arc::new(tx),
        }
    }

    /// Make the next `count` mutations fail with a service error
    pub fn fail_next_operations(&self, count: u32) {
        self.inner.lock().unwrap().fail_next = count;
    }

    /// Current collection state, in insertion order
    pub fn current(&self) -> Snapshot {
        self.inner.lock().unwrap().events.clone()
    }

    fn consume_fault(inner: &mut Inner) -> Result<()> {
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(SpartanvilleError::ServiceUnavailable(
                "event store".to_string(),
            ));
        }
        Ok(())
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.events.clone());
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn subscribe(&self) -> Result<Subscription> {
        let mut rx = self.tx.subscribe();
        let stream = async_stream::stream! {
            let initial = rx.borrow_and_update().clone();
            yield initial;
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                yield snapshot;
            }
        };

        Ok(Subscription::new(Box::pin(stream), None))
    }

    async fn create(&self, event: ValidatedEvent, created_by: Option<&str>) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        Self::consume_fault(&mut inner)?;

        let id = generate_uuid();

        inner.events.push(Event {
            id: id.clone(),
            title: event.title,
            date: event.date,
            time: event.time,
            location: event.location,
            image: event.image,
            club_association: event.club_association,
            attendance_count: 0,
            attendees: Vec::new(),
            created_by: created_by.map(|s| s.to_string()),
            created_at: Utc::now(),
        });

        self.publish(&inner);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::consume_fault(&mut inner)?;

        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        if inner.events.len() == before {
            return Err(SpartanvilleError::EventNotFound {
                event_id: id.to_string(),
            });
        }

        self.publish(&inner);
        Ok(())
    }

    async fn increment_field(&self, id: &str, field: CounterField, delta: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::consume_fault(&mut inner)?;

        let event = inner
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SpartanvilleError::EventNotFound {
                event_id: id.to_string(),
            })?;

        match field {
            CounterField::AttendanceCount => {
                event.attendance_count = (event.attendance_count + delta).max(0);
            }
        }

        self.publish(&inner);
        Ok(())
    }

    async fn set_member(&self, id: &str, user_id: &str, present: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::consume_fault(&mut inner)?;

        let event = inner
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SpartanvilleError::EventNotFound {
                event_id: id.to_string(),
            })?;

        if present {
            if !event.attendees.iter().any(|a| a == user_id) {
                event.attendees.push(user_id.to_string());
            }
        } else {
            event.attendees.retain(|a| a != user_id);
        }

        self.publish(&inner);
        Ok(())
    }
}
