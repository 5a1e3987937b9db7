//! Attendance reconciler
//!
//! Owns the locally-consistent view of the event collection under
//! concurrent multi-client mutation: the latest remote snapshot, the
//! current user's in-flight attendance intents, and optimistically removed
//! events awaiting delete acknowledgment.
//!
//! The reconciler is a plain state machine. It never performs I/O itself;
//! mutation entry points return descriptors of the remote calls to issue,
//! and acknowledgments are fed back through [`on_remote_ack`] /
//! [`on_delete_ack`]. Exclusive ownership by a single driver task makes
//! every handler body atomic with respect to the others.
//!
//! [`on_remote_ack`]: AttendanceReconciler::on_remote_ack
//! [`on_delete_ack`]: AttendanceReconciler::on_delete_ack

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::models::Event;
use crate::sync::intent::{AttendanceIntent, AttendanceMutation, IntentHandle, IntentStatus};
use crate::utils::errors::{Result, SpartanvilleError};

/// Display-ready projection of one event: the snapshot document merged with
/// the current user's optimistic state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    pub event: Event,
    /// Best-effort counter: snapshot value adjusted by any in-flight intent
    pub attendance_count: i64,
    /// Whether the current user is attending, latest intent winning over
    /// the snapshot
    pub attending: bool,
}

/// Outcome of feeding a toggle acknowledgment into the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDisposition {
    /// Intent confirmed; the next snapshot reflecting it absorbs the effect
    Confirmed,
    /// Intent failed; the optimistic adjustment has been reverted
    RolledBack,
    /// Acknowledgment for a superseded or discarded intent; dropped silently
    Stale,
}

/// Outcome of feeding a delete acknowledgment into the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDisposition {
    /// Remote delete succeeded
    Completed,
    /// Remote delete failed; the event has been restored locally
    Restored,
    /// No pending delete matched; dropped silently
    Unknown,
}

/// An optimistically removed event, kept for restoration on failure
#[derive(Debug, Clone)]
struct PendingDelete {
    event: Event,
    position: usize,
}

#[derive(Debug, Default)]
pub struct AttendanceReconciler {
    current_user: Option<String>,
    /// Latest remote snapshot, in arrival order
    base: Vec<Event>,
    /// Latest intent per event for the current user; older intents are
    /// superseded by replacement, so their acks fail the seq gate
    intents: HashMap<String, AttendanceIntent>,
    pending_deletes: HashMap<String, PendingDelete>,
    next_seq: u64,
}

impl AttendanceReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Update the authenticated user. Pending intents belong to the
    /// previous session and are discarded; their acknowledgments will be
    /// treated as stale.
    pub fn set_current_user(&mut self, user: Option<String>) {
        if self.current_user != user {
            if !self.intents.is_empty() {
                debug!(
                    discarded = self.intents.len(),
                    "Discarding pending intents on user change"
                );
            }
            self.intents.clear();
            self.current_user = user;
        }
    }

    /// Replace the base event set with the latest remote snapshot.
    ///
    /// Pending intents survive and keep adjusting the displayed state.
    /// Confirmed intents are discarded once the snapshot reflects them
    /// (or their event is gone); until then they keep the display from
    /// regressing under out-of-order snapshots.
    pub fn apply_snapshot(&mut self, events: Vec<Event>) {
        self.base = events;

        let base = &self.base;
        let user = self.current_user.clone();
        self.intents.retain(|event_id, intent| match intent.status {
            IntentStatus::Pending => true,
            IntentStatus::Confirmed => {
                let absorbed = match base.iter().find(|e| &e.id == event_id) {
                    Some(event) => {
                        user.as_deref().map(|u| event.has_attendee(u)).unwrap_or(false)
                            == intent.desired
                    }
                    None => true,
                };
                if absorbed {
                    trace!(event_id = %event_id, seq = intent.seq, "Confirmed intent absorbed by snapshot");
                }
                !absorbed
            }
            IntentStatus::Failed => false,
        });

        debug!(
            events = self.base.len(),
            pending_intents = self.intents.len(),
            "Snapshot applied"
        );
    }

    /// Record a new attendance intent and return the remote mutation to
    /// issue for it.
    ///
    /// Rejected locally, before any remote call, when no user is signed in
    /// or the event is not currently visible.
    pub fn toggle_attendance(
        &mut self,
        event_id: &str,
        desired: bool,
    ) -> Result<(IntentHandle, AttendanceMutation)> {
        let user = self
            .current_user
            .clone()
            .ok_or(SpartanvilleError::Unauthorized)?;

        if self.pending_deletes.contains_key(event_id)
            || !self.base.iter().any(|e| e.id == event_id)
        {
            return Err(SpartanvilleError::EventNotFound {
                event_id: event_id.to_string(),
            });
        }

        self.next_seq += 1;
        let intent = AttendanceIntent::new(event_id, &user, desired, self.next_seq);
        let handle = IntentHandle {
            event_id: event_id.to_string(),
            seq: intent.seq,
        };
        let mutation = AttendanceMutation {
            event_id: event_id.to_string(),
            user_id: user,
            desired,
            delta: intent.delta(),
        };

        // Replacing any previous entry supersedes it: its ack will no
        // longer match the stored seq
        self.intents.insert(event_id.to_string(), intent);

        debug!(event_id = event_id, seq = handle.seq, desired = desired, "Attendance toggle recorded");
        Ok((handle, mutation))
    }

    /// Resolve a toggle acknowledgment.
    ///
    /// Gated by sequence number: the most recently issued toggle wins, not
    /// the most recently arrived response. A failure of the live intent
    /// reverts the display to the underlying snapshot state, which restores
    /// the exact pre-toggle value without double-reverting raced toggles.
    pub fn on_remote_ack(&mut self, handle: &IntentHandle, success: bool) -> AckDisposition {
        let current_seq = match self.intents.get(&handle.event_id) {
            Some(intent) => intent.seq,
            None => {
                trace!(event_id = %handle.event_id, seq = handle.seq, "Ack for discarded intent dropped");
                return AckDisposition::Stale;
            }
        };

        if current_seq != handle.seq {
            trace!(
                event_id = %handle.event_id,
                ack_seq = handle.seq,
                current_seq = current_seq,
                "Stale ack dropped"
            );
            return AckDisposition::Stale;
        }

        if success {
            if let Some(intent) = self.intents.get_mut(&handle.event_id) {
                intent.status = IntentStatus::Confirmed;
            }
            debug!(event_id = %handle.event_id, seq = handle.seq, "Attendance toggle confirmed");
            AckDisposition::Confirmed
        } else {
            self.intents.remove(&handle.event_id);
            warn!(event_id = %handle.event_id, seq = handle.seq, "Attendance toggle failed, reverted");
            AckDisposition::RolledBack
        }
    }

    /// Optimistically remove an event; on success the caller issues the
    /// remote delete and feeds the result back via [`on_delete_ack`].
    ///
    /// Pending attendance intents for the event are discarded so their
    /// eventual acknowledgments are dropped as stale.
    ///
    /// [`on_delete_ack`]: AttendanceReconciler::on_delete_ack
    pub fn delete_event(&mut self, event_id: &str) -> Result<()> {
        if self.current_user.is_none() {
            return Err(SpartanvilleError::Unauthorized);
        }

        let position = self
            .base
            .iter()
            .position(|e| e.id == event_id)
            .ok_or_else(|| SpartanvilleError::EventNotFound {
                event_id: event_id.to_string(),
            })?;

        let event = self.base.remove(position);
        self.intents.remove(event_id);
        self.pending_deletes
            .insert(event_id.to_string(), PendingDelete { event, position });

        debug!(event_id = event_id, "Event optimistically removed");
        Ok(())
    }

    /// Resolve a delete acknowledgment, restoring the event on failure
    pub fn on_delete_ack(&mut self, event_id: &str, success: bool) -> DeleteDisposition {
        let pending = match self.pending_deletes.remove(event_id) {
            Some(pending) => pending,
            None => return DeleteDisposition::Unknown,
        };

        if success {
            debug!(event_id = event_id, "Event delete confirmed");
            return DeleteDisposition::Completed;
        }

        // Snapshots that arrived while the delete was pending may already
        // contain the document again
        if !self.base.iter().any(|e| e.id == event_id) {
            let position = pending.position.min(self.base.len());
            self.base.insert(position, pending.event);
        }

        warn!(event_id = event_id, "Event delete failed, restored locally");
        DeleteDisposition::Restored
    }

    /// The reconciled, display-ready event list in snapshot arrival order
    pub fn view(&self) -> Vec<EventView> {
        self.base
            .iter()
            .filter(|e| !self.pending_deletes.contains_key(&e.id))
            .map(|event| self.view_of(event))
            .collect()
    }

    fn view_of(&self, event: &Event) -> EventView {
        let snapshot_attending = self
            .current_user
            .as_deref()
            .map(|u| event.has_attendee(u))
            .unwrap_or(false);

        let (attendance_count, attending) = match self.intents.get(&event.id) {
            Some(intent) => {
                let count = if snapshot_attending == intent.desired {
                    // Snapshot already reflects the intent
                    event.attendance_count
                } else {
                    (event.attendance_count + intent.delta()).max(0)
                };
                (count, intent.desired)
            }
            None => (event.attendance_count, snapshot_attending),
        };

        EventView {
            event: event.clone(),
            attendance_count,
            attending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn event(id: &str, title: &str, count: i64, attendees: &[&str]) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            location: "Event Center".to_string(),
            image: None,
            club_association: None,
            attendance_count: count,
            attendees: attendees.iter().map(|s| s.to_string()).collect(),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn signed_in_reconciler(events: Vec<Event>) -> AttendanceReconciler {
        let mut reconciler = AttendanceReconciler::new();
        reconciler.set_current_user(Some("user-1".to_string()));
        reconciler.apply_snapshot(events);
        reconciler
    }

    #[test]
    fn test_toggle_is_optimistic() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        reconciler.toggle_attendance("e1", true).unwrap();

        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 6);
        assert!(view[0].attending);
    }

    #[test]
    fn test_failed_ack_reverts_exactly() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        let (handle, _) = reconciler.toggle_attendance("e1", true).unwrap();
        assert_eq!(reconciler.view()[0].attendance_count, 6);

        let disposition = reconciler.on_remote_ack(&handle, false);
        assert_eq!(disposition, AckDisposition::RolledBack);

        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 5);
        assert!(!view[0].attending);
    }

    #[test]
    fn test_unauthorized_toggle_rejected_before_remote_call() {
        let mut reconciler = AttendanceReconciler::new();
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 5, &[])]);

        let err = reconciler.toggle_attendance("e1", true).unwrap_err();
        assert_matches!(err, SpartanvilleError::Unauthorized);
        assert_eq!(reconciler.view()[0].attendance_count, 5);
    }

    #[test]
    fn test_toggle_unknown_event_rejected() {
        let mut reconciler = signed_in_reconciler(vec![]);
        let err = reconciler.toggle_attendance("missing", true).unwrap_err();
        assert_matches!(err, SpartanvilleError::EventNotFound { .. });
    }

    #[test]
    fn test_last_writer_wins_regardless_of_ack_order() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        let (first, _) = reconciler.toggle_attendance("e1", true).unwrap();
        let (second, _) = reconciler.toggle_attendance("e1", false).unwrap();
        assert!(second.seq > first.seq);

        // The earlier toggle's ack arrives last; it must not override
        assert_eq!(reconciler.on_remote_ack(&second, true), AckDisposition::Confirmed);
        assert_eq!(reconciler.on_remote_ack(&first, true), AckDisposition::Stale);

        assert!(!reconciler.view()[0].attending);
    }

    #[test]
    fn test_raced_toggles_do_not_double_revert() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        let (first, _) = reconciler.toggle_attendance("e1", true).unwrap();
        let (second, _) = reconciler.toggle_attendance("e1", false).unwrap();

        // Desired state matches the snapshot, so no adjustment is shown
        assert_eq!(reconciler.view()[0].attendance_count, 5);

        // The superseded toggle fails; display must not move
        assert_eq!(reconciler.on_remote_ack(&first, false), AckDisposition::Stale);
        assert_eq!(reconciler.view()[0].attendance_count, 5);

        // The live toggle fails; display reverts to the snapshot, once
        assert_eq!(reconciler.on_remote_ack(&second, false), AckDisposition::RolledBack);
        assert_eq!(reconciler.view()[0].attendance_count, 5);
        assert!(!reconciler.view()[0].attending);
    }

    #[test]
    fn test_snapshot_does_not_clobber_pending_intent() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        reconciler.toggle_attendance("e1", true).unwrap();

        // A concurrent snapshot arrives that has not caught up with our write
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 7, &[])]);

        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 8);
        assert!(view[0].attending);
    }

    #[test]
    fn test_snapshot_that_caught_up_is_not_double_counted() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        reconciler.toggle_attendance("e1", true).unwrap();

        // The snapshot now includes our own write
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 6, &["user-1"])]);

        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 6);
        assert!(view[0].attending);
    }

    #[test]
    fn test_displayed_count_never_negative() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 0, &["user-1"])]);

        reconciler.toggle_attendance("e1", false).unwrap();

        assert_eq!(reconciler.view()[0].attendance_count, 0);

        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 0, &["user-1"])]);
        assert_eq!(reconciler.view()[0].attendance_count, 0);
    }

    #[test]
    fn test_confirmed_intent_survives_stale_snapshot() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        let (handle, _) = reconciler.toggle_attendance("e1", true).unwrap();
        assert_eq!(reconciler.on_remote_ack(&handle, true), AckDisposition::Confirmed);

        // An out-of-order snapshot predating our write must not regress
        // the display
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 5, &[])]);
        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 6);
        assert!(view[0].attending);

        // Once a snapshot reflects the write, the intent is absorbed
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 6, &["user-1"])]);
        let view = reconciler.view();
        assert_eq!(view[0].attendance_count, 6);
        assert!(view[0].attending);
    }

    #[test]
    fn test_delete_is_optimistic_and_restores_on_failure() {
        let mut reconciler = signed_in_reconciler(vec![
            event("e1", "Welcome Week", 3, &[]),
            event("e2", "Career Fair", 5, &[]),
            event("e3", "Hackathon", 8, &[]),
        ]);

        reconciler.delete_event("e2").unwrap();
        let titles: Vec<_> = reconciler.view().iter().map(|v| v.event.title.clone()).collect();
        assert_eq!(titles, vec!["Welcome Week", "Hackathon"]);

        assert_eq!(reconciler.on_delete_ack("e2", false), DeleteDisposition::Restored);
        let titles: Vec<_> = reconciler.view().iter().map(|v| v.event.title.clone()).collect();
        assert_eq!(titles, vec!["Welcome Week", "Career Fair", "Hackathon"]);
    }

    #[test]
    fn test_delete_masks_lagging_snapshots() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        reconciler.delete_event("e1").unwrap();

        // The store has not processed the delete yet
        reconciler.apply_snapshot(vec![event("e1", "Career Fair", 5, &[])]);
        assert!(reconciler.view().is_empty());

        assert_eq!(reconciler.on_delete_ack("e1", true), DeleteDisposition::Completed);
    }

    #[test]
    fn test_stale_toggle_ack_after_delete_changes_nothing() {
        let mut reconciler = signed_in_reconciler(vec![
            event("e1", "Career Fair", 5, &[]),
            event("e2", "Hackathon", 2, &[]),
        ]);

        let (handle, _) = reconciler.toggle_attendance("e1", true).unwrap();
        reconciler.delete_event("e1").unwrap();

        // The toggle's acknowledgment straggles in after the local delete
        assert_eq!(reconciler.on_remote_ack(&handle, true), AckDisposition::Stale);

        let view = reconciler.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].event.id, "e2");
        assert_eq!(view[0].attendance_count, 2);
    }

    #[test]
    fn test_user_change_discards_intents() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &[])]);

        let (handle, _) = reconciler.toggle_attendance("e1", true).unwrap();
        reconciler.set_current_user(Some("user-2".to_string()));

        assert_eq!(reconciler.on_remote_ack(&handle, true), AckDisposition::Stale);
        assert_eq!(reconciler.view()[0].attendance_count, 5);
    }

    #[test]
    fn test_sign_out_hides_attendance() {
        let mut reconciler = signed_in_reconciler(vec![event("e1", "Career Fair", 5, &["user-1"])]);
        assert!(reconciler.view()[0].attending);

        reconciler.set_current_user(None);
        assert!(!reconciler.view()[0].attending);
    }
}
