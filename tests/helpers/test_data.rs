//! Test data helpers for creating test objects

use fake::faker::company::en::{CompanyName, Industry};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;

use spartanville::config::Settings;
use spartanville::models::CreateEventRequest;

/// Settings suitable for tests: validation passes and nothing points at
/// real infrastructure
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.api_key = "test-key".to_string();
    settings.assistant.api_key = "test-key".to_string();
    settings
}

/// A valid create-event request
pub fn create_event_request(title: &str) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        date: "2024-09-15".to_string(),
        time: "10:00".to_string(),
        location: "Event Center".to_string(),
        image: None,
        club_association: None,
    }
}

/// A valid create-event request with generated title and club
pub fn random_event_request() -> CreateEventRequest {
    let mut request = create_event_request(&CompanyName().fake::<String>());
    request.club_association = Some(Industry().fake::<String>());
    request
}

/// A generated campus email address
pub fn random_email() -> String {
    SafeEmail().fake()
}
