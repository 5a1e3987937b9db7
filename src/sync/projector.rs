//! Event view projector
//!
//! Pure derivation of the visible event list from the reconciled set.
//! No side effects and no re-sorting; cheap enough to run on every
//! keystroke of the search input.

use crate::sync::reconciler::EventView;

/// Filter the reconciled event list.
///
/// An event passes when the query is empty, or matches its title or club
/// association case-insensitively as a substring (an event without a club
/// association never matches a non-empty query). With `user_events_only`
/// the current user must also be attending. Input order is preserved.
pub fn project(events: &[EventView], search_query: &str, user_events_only: bool) -> Vec<EventView> {
    let query = search_query.trim().to_lowercase();

    events
        .iter()
        .filter(|view| {
            if user_events_only && !view.attending {
                return false;
            }
            if query.is_empty() {
                return true;
            }
            if view.event.title.to_lowercase().contains(&query) {
                return true;
            }
            view.event
                .club_association
                .as_deref()
                .map(|club| club.to_lowercase().contains(&query))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn view(id: &str, title: &str, club: Option<&str>, attending: bool) -> EventView {
        EventView {
            event: Event {
                id: id.to_string(),
                title: title.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
                time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                location: "Event Center".to_string(),
                image: None,
                club_association: club.map(|s| s.to_string()),
                attendance_count: 0,
                attendees: Vec::new(),
                created_by: None,
                created_at: Utc::now(),
            },
            attendance_count: 0,
            attending,
        }
    }

    fn sample() -> Vec<EventView> {
        vec![
            view("e1", "Career Fair", None, false),
            view("e2", "Welcome Week", Some("Student Union"), true),
            view("e3", "Salsa Night", Some("Dance Club"), true),
        ]
    }

    #[test]
    fn test_empty_query_is_identity() {
        let events = sample();
        let projected = project(&events, "", false);
        assert_eq!(projected, events);
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let events = sample();
        let projected = project(&events, "career", false);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].event.title, "Career Fair");
    }

    #[test]
    fn test_club_association_matches() {
        let events = sample();
        let projected = project(&events, "dance", false);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].event.id, "e3");
    }

    #[test]
    fn test_absent_club_never_matches_non_empty_query() {
        let events = vec![view("e1", "Career Fair", None, false)];
        assert!(project(&events, "club", false).is_empty());
    }

    #[test]
    fn test_user_events_only_requires_attending() {
        let events = sample();
        let projected = project(&events, "", true);
        let ids: Vec<_> = projected.iter().map(|v| v.event.id.clone()).collect();
        assert_eq!(ids, vec!["e2", "e3"]);
    }

    #[test]
    fn test_filters_compose() {
        let events = sample();
        let projected = project(&events, "welcome", true);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].event.id, "e2");
    }

    #[test]
    fn test_order_is_preserved() {
        let events = vec![
            view("e1", "Club Fair", Some("Chess Club"), false),
            view("e2", "Book Club Social", None, false),
            view("e3", "Club Sports Day", None, false),
        ];
        let projected = project(&events, "club", false);
        let ids: Vec<_> = projected.iter().map(|v| v.event.id.clone()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
    }
}
