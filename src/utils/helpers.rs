//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use crate::config::CampusConfig;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a short alphanumeric request id for outbound API calls
pub fn generate_request_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    let mut rng = rand::thread_rng();

    (0..12)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Format an event's date and time for user-facing text
pub fn format_event_schedule(date: NaiveDate, time: NaiveTime) -> String {
    format!("{} at {}", date.format("%Y-%m-%d"), time.format("%H:%M"))
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        text.to_string()
    } else {
        format!("{}...", &text[..max_length.saturating_sub(3)])
    }
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.') && email.len() > 5
}

/// Build the campus map embed URL for the configured place
pub fn campus_map_embed_url(campus: &CampusConfig) -> String {
    format!(
        "https://www.google.com/maps?q={}&output=embed",
        urlencoding::encode(&campus.place_query)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("student@sjsu.edu"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn test_format_event_schedule() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(format_event_schedule(date, time), "2024-09-15 at 10:00");
    }

    #[test]
    fn test_campus_map_embed_url_encodes_query() {
        let campus = CampusConfig {
            name: "San José State University".to_string(),
            place_query: "San José State University".to_string(),
        };
        let url = campus_map_embed_url(&campus);
        assert!(url.starts_with("https://www.google.com/maps?q="));
        assert!(!url.contains(' '));
        assert!(url.ends_with("&output=embed"));
    }

    #[test]
    fn test_request_id_shape() {
        let id = generate_request_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
