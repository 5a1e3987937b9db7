//! Services module
//!
//! This module contains business logic services

pub mod assistant;
pub mod auth;
pub mod events;
pub mod identity;
pub mod notification;
pub mod weather;

// Re-export commonly used services
pub use assistant::AssistantService;
pub use auth::{AuthService, AuthState};
pub use events::EventService;
pub use identity::{IdentityClient, IdentitySession};
pub use notification::{
    Notification, NotificationService, NotificationSink, NotificationStats, NotificationVariant,
    RecordingSink,
};
pub use weather::WeatherService;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::state::SessionStorage;
use crate::store::EventStore;
use crate::sync::SyncEngine;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub weather_service: WeatherService,
    pub assistant_service: AssistantService,
    pub notification_service: NotificationService,
    pub sync_engine: SyncEngine,
    session_storage: Option<SessionStorage>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    ///
    /// When a Redis client is supplied, sessions persist across restarts
    /// and weather reports are cached; without one both features degrade
    /// gracefully.
    pub async fn new(
        store: Arc<dyn EventStore>,
        settings: Settings,
        redis_client: Option<redis::Client>,
    ) -> Result<Self> {
        let notification_service = NotificationService::new();

        let session_storage = match &redis_client {
            Some(_) => Some(SessionStorage::new(settings.redis.clone()).await?),
            None => None,
        };

        let identity_client = IdentityClient::new(settings.clone())?;
        let mut auth_service = AuthService::new(
            identity_client,
            notification_service.clone(),
            settings.clone(),
        );
        if let Some(sessions) = session_storage.clone() {
            auth_service = auth_service.with_session_storage(sessions);
        }

        let sync_engine = SyncEngine::start(
            store.clone(),
            notification_service.clone(),
            auth_service.current_user(),
        )
        .await?;

        let event_service = EventService::new(
            store,
            sync_engine.clone(),
            notification_service.clone(),
            auth_service.current_user(),
        );

        let mut weather_service = WeatherService::new(settings.clone())?;
        if let Some(client) = redis_client {
            weather_service = weather_service.with_cache(client);
        }

        let assistant_service = AssistantService::new(settings)?;

        Ok(Self {
            auth_service,
            event_service,
            weather_service,
            assistant_service,
            notification_service,
            sync_engine,
            session_storage,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = match &self.session_storage {
            Some(sessions) => sessions.test_connection().await.is_ok(),
            None => false,
        };

        ServiceHealthStatus {
            redis_healthy,
            weather_enabled: self.weather_service.is_enabled(),
            assistant_enabled: self.assistant_service.is_enabled(),
            sync_engine_ready: true,
        }
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory").finish_non_exhaustive()
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub redis_healthy: bool,
    pub weather_enabled: bool,
    pub assistant_enabled: bool,
    pub sync_engine_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.sync_engine_ready
    }

    /// Get list of degraded services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }
        if !self.sync_engine_ready {
            issues.push("Sync engine not ready".to_string());
        }

        issues
    }
}
