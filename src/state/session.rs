//! Session persistence
//!
//! This module handles persistence of authenticated sessions using Redis,
//! including serialization, expiration, and cleanup.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::RedisConfig;
use crate::models::UserProfile;
use crate::utils::errors::Result;

/// An authenticated session as persisted between restarts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub profile: UserProfile,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session's token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Redis-based session storage
#[derive(Clone)]
pub struct SessionStorage {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
}

impl SessionStorage {
    /// Create a new session storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Save a session, expiring it alongside its token
    pub async fn save_session(&self, session: &AuthSession) -> Result<()> {
        let key = self.session_key(&session.profile.uid);
        let serialized = match serde_json::to_string(session) {
            Ok(data) => data,
            Err(e) => {
                error!(uid = %session.profile.uid, error = %e, "Failed to serialize session");
                return Err(e.into());
            }
        };

        let ttl_seconds = {
            let remaining = session.expires_at - Utc::now();
            std::cmp::max(remaining.num_seconds(), 60) as u64
        };

        let mut conn = self.connection_manager.clone();
        conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await?;

        debug!(uid = %session.profile.uid, ttl_seconds = ttl_seconds, "Session saved");
        Ok(())
    }

    /// Load a session; expired sessions are removed and reported as absent
    pub async fn load_session(&self, uid: &str) -> Result<Option<AuthSession>> {
        let key = self.session_key(uid);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = conn.get(&key).await?;

        match serialized {
            Some(data) => {
                let session: AuthSession = match serde_json::from_str(&data) {
                    Ok(session) => session,
                    Err(e) => {
                        error!(uid = uid, error = %e, "Failed to deserialize session, removing");
                        self.delete_session(uid).await?;
                        return Ok(None);
                    }
                };

                if session.is_expired() {
                    warn!(uid = uid, expires_at = %session.expires_at, "Session expired, removing");
                    self.delete_session(uid).await?;
                    return Ok(None);
                }

                debug!(uid = uid, "Session loaded");
                Ok(Some(session))
            }
            None => {
                debug!(uid = uid, "No session found");
                Ok(None)
            }
        }
    }

    /// Delete a session
    pub async fn delete_session(&self, uid: &str) -> Result<()> {
        let key = self.session_key(uid);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&key).await?;
        if deleted > 0 {
            debug!(uid = uid, "Session deleted");
        }

        Ok(())
    }

    /// Check whether a session exists for a user
    pub async fn session_exists(&self, uid: &str) -> Result<bool> {
        let key = self.session_key(uid);
        let mut conn = self.connection_manager.clone();

        let exists: bool = conn.exists(&key).await?;
        Ok(exists)
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn session_key(&self, uid: &str) -> String {
        format!("{}session:{}", self.config.prefix, uid)
    }
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthProvider;
    use chrono::Duration;

    fn session(expires_in: Duration) -> AuthSession {
        AuthSession {
            profile: UserProfile {
                uid: "uid-123".to_string(),
                email: "student@sjsu.edu".to_string(),
                display_name: None,
                provider: AuthProvider::Password,
            },
            id_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_expiry_check() {
        assert!(!session(Duration::hours(1)).is_expired());
        assert!(session(Duration::hours(-1)).is_expired());
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let session = session(Duration::hours(1));
        let serialized = serde_json::to_string(&session).unwrap();
        let restored: AuthSession = serde_json::from_str(&serialized).unwrap();
        assert_eq!(restored.profile, session.profile);
        assert_eq!(restored.id_token, session.id_token);
    }
}
