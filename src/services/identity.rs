//! Identity provider client
//!
//! REST client for the managed identity service backing sign-in: email/
//! password credentials, Google sign-in via ID-token exchange, and account
//! creation. Provider error codes are mapped onto [`IdentityError`]
//! variants so callers can distinguish bad credentials from outages.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::utils::errors::{IdentityError, IdentityResult, Result, SpartanvilleError};
use crate::utils::helpers::generate_request_id;
use crate::utils::logging::log_api_error;

/// Successful sign-in/sign-up response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySession {
    pub local_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds until `id_token` expires, as sent by the provider
    pub expires_in: String,
}

impl IdentitySession {
    /// Token lifetime in seconds, defaulting to an hour on a malformed value
    pub fn expires_in_seconds(&self) -> u64 {
        self.expires_in.parse().unwrap_or(3600)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpSignInRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Identity provider REST client
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    settings: Settings,
}

impl IdentityClient {
    /// Create a new IdentityClient instance
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.auth.timeout_seconds))
            .user_agent("Spartanville/1.0")
            .build()
            .map_err(SpartanvilleError::Http)?;

        Ok(Self { client, settings })
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<IdentitySession> {
        debug!(email = email, "Signing in with password");
        self.post(
            "accounts:signInWithPassword",
            &PasswordSignInRequest {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Create a new email/password account
    pub async fn sign_up(&self, email: &str, password: &str) -> IdentityResult<IdentitySession> {
        debug!(email = email, "Creating account");
        self.post(
            "accounts:signUp",
            &PasswordSignInRequest {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Sign in with a Google ID token
    pub async fn sign_in_with_google(&self, id_token: &str) -> IdentityResult<IdentitySession> {
        debug!("Signing in with Google credential");
        self.post(
            "accounts:signInWithIdp",
            &IdpSignInRequest {
                post_body: format!(
                    "id_token={}&providerId=google.com",
                    urlencoding::encode(id_token)
                ),
                request_uri: "http://localhost",
                return_secure_token: true,
            },
        )
        .await
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> IdentityResult<IdentitySession> {
        let url = format!(
            "{}/{}?key={}",
            self.settings.auth.api_url, endpoint, self.settings.auth.api_key
        );
        let request_id = generate_request_id();

        let response = self
            .client
            .post(&url)
            .header("x-request-id", &request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else if e.is_connect() {
                    IdentityError::ServiceUnavailable
                } else {
                    IdentityError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ProviderErrorBody>(&body_text)
                .map(|b| b.error.message)
                .unwrap_or_default();

            warn!(request_id = %request_id, status = %status, code = %code, "Identity request rejected");
            log_api_error("identity", &code, Some(endpoint));
            return Err(Self::map_provider_error(&code, status.as_u16()));
        }

        let session: IdentitySession = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        info!(request_id = %request_id, uid = %session.local_id, "Identity request succeeded");
        Ok(session)
    }

    fn map_provider_error(code: &str, status: u16) -> IdentityError {
        // The provider reports the specific cause as an upper-snake message;
        // variants like EMAIL_NOT_FOUND : ... carry a suffix
        let base = code.split(':').next().unwrap_or("").trim();
        match base {
            "EMAIL_NOT_FOUND" => IdentityError::EmailNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => IdentityError::InvalidPassword,
            "EMAIL_EXISTS" => IdentityError::EmailExists,
            "INVALID_IDP_RESPONSE" | "INVALID_ID_TOKEN" => {
                IdentityError::InvalidIdpCredential(code.to_string())
            }
            _ if status >= 500 => IdentityError::ServiceUnavailable,
            _ => IdentityError::RequestFailed(format!("HTTP {}: {}", status, code)),
        }
    }
}
