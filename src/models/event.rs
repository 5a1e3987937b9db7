//! Event model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A campus event document as published by the event store.
///
/// `id` is assigned by the store on creation and stable for the document's
/// lifetime. `attendance_count` is a globally shared counter; it is only a
/// best-effort projection locally until a remote confirmation arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub image: Option<String>,
    pub club_association: Option<String>,
    pub attendance_count: i64,
    pub attendees: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether the given user is recorded as attending in this document
    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|a| a == user_id)
    }
}

/// Fields supplied when creating a new event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image: Option<String>,
    pub club_association: Option<String>,
}

/// A validated create request, ready to hand to the store
#[derive(Debug, Clone)]
pub struct ValidatedEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub image: Option<String>,
    pub club_association: Option<String>,
}
