//! Attendance intent tracking
//!
//! An intent is a locally recorded, not-yet-confirmed attendance change for
//! one (event, user) pair. Intents carry a monotonically increasing local
//! sequence number; when several toggles race, the highest sequence number
//! wins regardless of the order in which their acknowledgments arrive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an attendance intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentStatus {
    /// Optimistically applied, remote mutation in flight
    Pending,
    /// Remote mutation acknowledged; superseded by the next snapshot
    Confirmed,
    /// Remote mutation rejected; optimistic effect reverted
    Failed,
}

/// A locally recorded attendance change awaiting remote confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceIntent {
    pub event_id: String,
    pub user_id: String,
    pub desired: bool,
    pub seq: u64,
    pub status: IntentStatus,
    pub issued_at: DateTime<Utc>,
}

impl AttendanceIntent {
    pub fn new(event_id: &str, user_id: &str, desired: bool, seq: u64) -> Self {
        Self {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            desired,
            seq,
            status: IntentStatus::Pending,
            issued_at: Utc::now(),
        }
    }

    /// The counter delta this intent contributes while the snapshot has not
    /// caught up with it
    pub fn delta(&self) -> i64 {
        if self.desired {
            1
        } else {
            -1
        }
    }
}

/// Handle identifying one issued intent; resolved by the remote acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentHandle {
    pub event_id: String,
    pub seq: u64,
}

/// Remote mutation an intent needs issued on its behalf
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceMutation {
    pub event_id: String,
    pub user_id: String,
    pub desired: bool,
    pub delta: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_intent_is_pending() {
        let intent = AttendanceIntent::new("evt-1", "user-1", true, 7);
        assert_eq!(intent.status, IntentStatus::Pending);
        assert_eq!(intent.seq, 7);
        assert_eq!(intent.delta(), 1);
    }

    #[test]
    fn test_delta_sign_follows_desired_state() {
        assert_eq!(AttendanceIntent::new("e", "u", true, 0).delta(), 1);
        assert_eq!(AttendanceIntent::new("e", "u", false, 0).delta(), -1);
    }
}
