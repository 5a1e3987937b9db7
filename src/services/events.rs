//! Event directory service implementation
//!
//! Entry points for creating and deleting events. Requests are validated
//! before any remote call; deletes route through the sync engine so the
//! optimistic-removal and rollback semantics apply.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;
use tokio::sync::watch;
use tracing::info;

use crate::models::{CreateEventRequest, ValidatedEvent};
use crate::services::notification::{Notification, NotificationService, NotificationVariant};
use crate::store::EventStore;
use crate::sync::SyncEngine;
use crate::utils::errors::{Result, SpartanvilleError};
use crate::utils::helpers::format_event_schedule;
use crate::utils::logging::log_event_action;

fn time_shape() -> &'static Regex {
    static TIME_SHAPE: OnceLock<Regex> = OnceLock::new();
    TIME_SHAPE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("static pattern"))
}

/// Event directory service
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    engine: SyncEngine,
    notifications: NotificationService,
    current_user: watch::Receiver<Option<String>>,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(
        store: Arc<dyn EventStore>,
        engine: SyncEngine,
        notifications: NotificationService,
        current_user: watch::Receiver<Option<String>>,
    ) -> Self {
        Self {
            store,
            engine,
            notifications,
            current_user,
        }
    }

    /// Create a new event. Validation failures block the request before
    /// any remote call.
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<String> {
        let user = self
            .current_user
            .borrow()
            .clone()
            .ok_or(SpartanvilleError::Unauthorized)?;

        let validated = validate_request(&request)?;
        let schedule = format_event_schedule(validated.date, validated.time);

        let id = self.store.create(validated, Some(&user)).await?;

        log_event_action(&id, "create", Some(&user), Some(&schedule));
        self.notifications.notify(Notification {
            title: "Event created".to_string(),
            description: "Your new event has been successfully added.".to_string(),
            variant: NotificationVariant::Normal,
        });

        info!(event_id = %id, user_id = %user, "Event created");
        Ok(id)
    }

    /// Delete an event through the sync engine (optimistic removal,
    /// restored with a destructive notification on remote failure)
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        self.engine.delete_event(event_id).await?;
        log_event_action(event_id, "delete", self.current_user.borrow().as_deref(), None);
        Ok(())
    }
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService").finish_non_exhaustive()
    }
}

/// Validate a create request, parsing its date and time fields
pub fn validate_request(request: &CreateEventRequest) -> Result<ValidatedEvent> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(SpartanvilleError::InvalidInput(
            "Event title must not be empty".to_string(),
        ));
    }

    let location = request.location.trim();
    if location.is_empty() {
        return Err(SpartanvilleError::InvalidInput(
            "Event location must not be empty".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d").map_err(|_| {
        SpartanvilleError::InvalidInput(format!("Invalid event date: {}", request.date))
    })?;

    let time_text = request.time.trim();
    if !time_shape().is_match(time_text) {
        return Err(SpartanvilleError::InvalidInput(format!(
            "Invalid event time: {}",
            request.time
        )));
    }
    let time = NaiveTime::parse_from_str(time_text, "%H:%M").map_err(|_| {
        SpartanvilleError::InvalidInput(format!("Invalid event time: {}", request.time))
    })?;

    let image = match request.image.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let parsed = url::Url::parse(raw).map_err(|_| {
                SpartanvilleError::InvalidInput(format!("Invalid image URL: {}", raw))
            })?;
            Some(parsed.to_string())
        }
    };

    let club_association = match request.club_association.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(club) => Some(club.to_string()),
    };

    Ok(ValidatedEvent {
        title: title.to_string(),
        date,
        time,
        location: location.to_string(),
        image,
        club_association,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> CreateEventRequest {
        CreateEventRequest {
            title: "Career Fair".to_string(),
            date: "2024-09-15".to_string(),
            time: "10:00".to_string(),
            location: "Event Center".to_string(),
            image: None,
            club_association: None,
        }
    }

    #[test]
    fn test_valid_request_parses() {
        let validated = validate_request(&request()).unwrap();
        assert_eq!(validated.title, "Career Fair");
        assert_eq!(validated.date, NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
        assert_eq!(validated.time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut req = request();
        req.title = "   ".to_string();
        assert_matches!(
            validate_request(&req).unwrap_err(),
            SpartanvilleError::InvalidInput(_)
        );
    }

    #[test]
    fn test_malformed_date_rejected() {
        let mut req = request();
        req.date = "09/15/2024".to_string();
        assert_matches!(
            validate_request(&req).unwrap_err(),
            SpartanvilleError::InvalidInput(_)
        );
    }

    #[test]
    fn test_unpadded_time_rejected() {
        let mut req = request();
        req.time = "9:00".to_string();
        assert_matches!(
            validate_request(&req).unwrap_err(),
            SpartanvilleError::InvalidInput(_)
        );
    }

    #[test]
    fn test_out_of_range_time_rejected() {
        let mut req = request();
        req.time = "25:00".to_string();
        assert_matches!(
            validate_request(&req).unwrap_err(),
            SpartanvilleError::InvalidInput(_)
        );
    }

    #[test]
    fn test_invalid_image_url_rejected() {
        let mut req = request();
        req.image = Some("not a url".to_string());
        assert_matches!(
            validate_request(&req).unwrap_err(),
            SpartanvilleError::InvalidInput(_)
        );
    }

    #[test]
    fn test_empty_optional_fields_become_absent() {
        let mut req = request();
        req.image = Some("".to_string());
        req.club_association = Some("  ".to_string());

        let validated = validate_request(&req).unwrap();
        assert!(validated.image.is_none());
        assert!(validated.club_association.is_none());
    }

    #[test]
    fn test_valid_image_url_kept() {
        let mut req = request();
        req.image = Some("https://example.edu/banner.png".to_string());
        let validated = validate_request(&req).unwrap();
        assert_eq!(
            validated.image.as_deref(),
            Some("https://example.edu/banner.png")
        );
    }
}
