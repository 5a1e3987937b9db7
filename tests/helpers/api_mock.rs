//! Mock HTTP servers for the external APIs
//!
//! Wiremock-backed stand-ins for the identity provider, the weather API,
//! and the assistant API, with configurable success and failure responses.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock identity provider server
pub struct IdentityMockServer {
    pub server: MockServer,
}

impl IdentityMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_url(&self) -> String {
        self.server.uri()
    }

    /// Accept password sign-in for the given account
    pub async fn mock_password_sign_in(&self, uid: &str, email: &str) {
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": uid,
                "email": email,
                "displayName": "Sammy Spartan",
                "idToken": "test-id-token",
                "refreshToken": "test-refresh-token",
                "expiresIn": "3600"
            })))
            .mount(&self.server)
            .await;
    }

    /// Reject password sign-in with a provider error code
    pub async fn mock_sign_in_rejection(&self, code: &str) {
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": code }
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept Google ID-token sign-in
    pub async fn mock_google_sign_in(&self, uid: &str, email: &str) {
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithIdp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": uid,
                "email": email,
                "idToken": "test-id-token",
                "refreshToken": "test-refresh-token",
                "expiresIn": "3600"
            })))
            .mount(&self.server)
            .await;
    }
}

/// Mock weather API server
pub struct WeatherMockServer {
    pub server: MockServer,
}

impl WeatherMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_url(&self) -> String {
        format!("{}/v1/forecast", self.server.uri())
    }

    /// Serve a forecast where the current hour is 10:00 with the given
    /// hourly precipitation probabilities
    pub async fn mock_forecast(&self, current_temp: f64, precipitation: Vec<i64>) {
        let hours: Vec<String> = (0..24).map(|h| format!("2024-09-15T{:02}:00", h)).collect();
        let temps: Vec<f64> = (0..24).map(|h| 60.0 + h as f64).collect();

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": {
                    "time": "2024-09-15T10:45",
                    "temperature_2m": current_temp,
                    "precipitation": 0.0
                },
                "hourly": {
                    "time": hours,
                    "temperature_2m": temps,
                    "precipitation_probability": precipitation
                }
            })))
            .mount(&self.server)
            .await;
    }
}

/// Mock assistant API server
pub struct AssistantMockServer {
    pub server: MockServer,
}

impl AssistantMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_url(&self) -> String {
        self.server.uri()
    }

    /// Reply to any prompt with the given text
    pub async fn mock_reply(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "content": [ { "type": "text", "text": text } ],
                "model": "claude-3-haiku-20240307",
                "stop_reason": "end_turn"
            })))
            .mount(&self.server)
            .await;
    }

    /// Fail every prompt with a server error
    pub async fn mock_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "type": "error",
                "error": { "type": "api_error", "message": "internal error" }
            })))
            .mount(&self.server)
            .await;
    }
}
