//! Authentication service implementation
//!
//! Owns the sign-in state machine and the read-only current-user signal
//! consumed by the rest of the application. Credential verification is
//! delegated to the identity provider via [`IdentityClient`]; sessions are
//! persisted in Redis when storage is attached.
//!
//! State machine: `SignedOut → Authenticating → SignedIn → SignedOut`.
//! A second sign-in attempt while one is in flight, or while already
//! signed in, is rejected as an invalid transition.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::models::{AuthProvider, UserProfile};
use crate::services::identity::{IdentityClient, IdentitySession};
use crate::services::notification::{Notification, NotificationService, NotificationVariant};
use crate::state::{AuthSession, SessionStorage};
use crate::utils::errors::{Result, SpartanvilleError};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::log_auth_event;

/// Authentication state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    SignedOut,
    Authenticating,
    SignedIn(UserProfile),
}

impl AuthState {
    fn name(&self) -> &'static str {
        match self {
            AuthState::SignedOut => "signed_out",
            AuthState::Authenticating => "authenticating",
            AuthState::SignedIn(_) => "signed_in",
        }
    }
}

/// Authentication service managing the session lifecycle
#[derive(Clone)]
pub struct AuthService {
    identity: IdentityClient,
    sessions: Option<SessionStorage>,
    notifications: NotificationService,
    settings: Settings,
    state: Arc<Mutex<AuthState>>,
    user_tx: Arc<watch::Sender<Option<String>>>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(
        identity: IdentityClient,
        notifications: NotificationService,
        settings: Settings,
    ) -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            identity,
            sessions: None,
            notifications,
            settings,
            state: Arc::new(Mutex::new(AuthState::SignedOut)),
            user_tx: Arc::new(user_tx),
        }
    }

    /// Attach Redis-backed session persistence
    pub fn with_session_storage(mut self, sessions: SessionStorage) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// The read-only current-user signal: `Some(uid)` while signed in
    pub fn current_user(&self) -> watch::Receiver<Option<String>> {
        self.user_tx.subscribe()
    }

    /// Current authentication state
    pub fn state(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<UserProfile> {
        if !is_valid_email(email) {
            return Err(SpartanvilleError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(SpartanvilleError::InvalidInput(
                "Password must not be empty".to_string(),
            ));
        }

        self.begin_authentication()?;

        match self.identity.sign_in_with_password(email, password).await {
            Ok(session) => {
                let profile = self
                    .complete_sign_in(session, AuthProvider::Password)
                    .await?;
                self.notifications.notify(Notification {
                    title: "Logged in successfully".to_string(),
                    description: "Welcome back to Spartanville!".to_string(),
                    variant: NotificationVariant::Normal,
                });
                Ok(profile)
            }
            Err(e) => Err(self.fail_sign_in(e.into())),
        }
    }

    /// Sign in with a Google ID token
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProfile> {
        if !self.settings.features.google_sign_in {
            return Err(SpartanvilleError::ServiceUnavailable(
                "Google sign-in is disabled".to_string(),
            ));
        }
        if id_token.is_empty() {
            return Err(SpartanvilleError::InvalidInput(
                "A Google credential is required".to_string(),
            ));
        }

        self.begin_authentication()?;

        match self.identity.sign_in_with_google(id_token).await {
            Ok(session) => {
                let profile = self.complete_sign_in(session, AuthProvider::Google).await?;
                self.notifications.notify(Notification {
                    title: "Logged in with Google".to_string(),
                    description: "Welcome to Spartanville!".to_string(),
                    variant: NotificationVariant::Normal,
                });
                Ok(profile)
            }
            Err(e) => Err(self.fail_sign_in(e.into())),
        }
    }

    /// Create an account and sign in with it
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserProfile> {
        if !is_valid_email(email) {
            return Err(SpartanvilleError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }
        if password.len() < 6 {
            return Err(SpartanvilleError::InvalidInput(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        self.begin_authentication()?;

        match self.identity.sign_up(email, password).await {
            Ok(session) => {
                let profile = self
                    .complete_sign_in(session, AuthProvider::Password)
                    .await?;
                self.notifications.notify(Notification {
                    title: "Account created".to_string(),
                    description: "Welcome to Spartanville!".to_string(),
                    variant: NotificationVariant::Normal,
                });
                Ok(profile)
            }
            Err(e) => Err(self.fail_sign_in(e.into())),
        }
    }

    /// Sign out, clearing the persisted session and broadcasting absence.
    /// Idempotent: signing out while signed out is a no-op.
    pub async fn sign_out(&self) -> Result<()> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            std::mem::replace(&mut *state, AuthState::SignedOut)
        };

        if let AuthState::SignedIn(profile) = previous {
            if let Some(sessions) = &self.sessions {
                sessions.delete_session(&profile.uid).await?;
            }
            self.user_tx.send_replace(None);
            log_auth_event(Some(&profile.uid), "sign_out", None);
        }

        Ok(())
    }

    fn begin_authentication(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match &*state {
            AuthState::SignedOut => {
                *state = AuthState::Authenticating;
                Ok(())
            }
            other => Err(SpartanvilleError::InvalidStateTransition {
                from: other.name().to_string(),
                to: AuthState::Authenticating.name().to_string(),
            }),
        }
    }

    async fn complete_sign_in(
        &self,
        session: IdentitySession,
        provider: AuthProvider,
    ) -> Result<UserProfile> {
        let profile = UserProfile {
            uid: session.local_id.clone(),
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            provider,
        };

        if let Some(sessions) = &self.sessions {
            let auth_session = AuthSession {
                profile: profile.clone(),
                id_token: session.id_token.clone(),
                refresh_token: session.refresh_token.clone(),
                expires_at: Utc::now() + Duration::seconds(session.expires_in_seconds() as i64),
            };
            if let Err(e) = sessions.save_session(&auth_session).await {
                // Persistence is best-effort; the in-memory session stands
                warn!(uid = %profile.uid, error = %e, "Failed to persist session");
            }
        }

        {
            let mut state = self.state.lock().unwrap();
            *state = AuthState::SignedIn(profile.clone());
        }
        self.user_tx.send_replace(Some(profile.uid.clone()));

        log_auth_event(Some(&profile.uid), "sign_in", Some(&provider.to_string()));
        info!(uid = %profile.uid, provider = %provider, "User signed in");
        Ok(profile)
    }

    fn fail_sign_in(&self, error: SpartanvilleError) -> SpartanvilleError {
        {
            let mut state = self.state.lock().unwrap();
            *state = AuthState::SignedOut;
        }

        self.notifications.notify(Notification {
            title: "Sign-in failed".to_string(),
            description: error.to_string(),
            variant: NotificationVariant::Destructive,
        });

        log_auth_event(None, "sign_in_failed", None);
        error
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("state", &self.state.lock().unwrap().name())
            .finish_non_exhaustive()
    }
}
