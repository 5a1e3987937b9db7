//! Campus weather service implementation
//!
//! Fetches the hourly forecast for the campus coordinates and condenses it
//! into the report the application shows: current conditions plus the next
//! four hours. Reports are cached in Redis for the configured refresh
//! interval so repeated reads within it do not hit the upstream API.

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use redis::AsyncCommands;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::models::{CurrentConditions, HourlyForecast, WeatherCondition, WeatherReport};
use crate::utils::errors::{Result, SpartanvilleError, WeatherError, WeatherResult};
use crate::utils::logging::log_api_error;

/// Number of upcoming hours included in the condensed report
const FORECAST_HOURS: usize = 4;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Raw forecast response from the weather API
#[derive(Debug, Clone, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
}

#[derive(Debug, Clone, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    precipitation_probability: Vec<i64>,
}

/// Weather service for campus conditions
#[derive(Clone)]
pub struct WeatherService {
    client: Client,
    redis_client: Option<redis::Client>,
    settings: Settings,
}

impl WeatherService {
    /// Create a new WeatherService instance
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.weather.timeout_seconds))
            .user_agent("Spartanville/1.0")
            .build()
            .map_err(SpartanvilleError::Http)?;

        Ok(Self {
            client,
            redis_client: None,
            settings,
        })
    }

    /// Attach a Redis client for report caching
    pub fn with_cache(mut self, redis_client: redis::Client) -> Self {
        self.redis_client = Some(redis_client);
        self
    }

    /// Get the current campus weather report, from cache when fresh
    pub async fn current_report(&self) -> Result<WeatherReport> {
        if let Some(cached) = self.cached_report().await? {
            debug!("Serving cached weather report");
            return Ok(cached);
        }

        let report = self.fetch_report().await?;
        self.cache_report(&report).await?;
        Ok(report)
    }

    /// Fetch a fresh report, bypassing the cache
    pub async fn fetch_report(&self) -> Result<WeatherReport> {
        let response = self
            .client
            .get(&self.settings.weather.api_url)
            .query(&[
                ("latitude", self.settings.weather.latitude.to_string()),
                ("longitude", self.settings.weather.longitude.to_string()),
                ("current", "temperature_2m,precipitation".to_string()),
                (
                    "hourly",
                    "temperature_2m,precipitation_probability".to_string(),
                ),
                ("temperature_unit", "fahrenheit".to_string()),
                ("timezone", self.settings.weather.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpartanvilleError::Weather(WeatherError::Timeout)
                } else if e.is_connect() {
                    SpartanvilleError::Weather(WeatherError::ServiceUnavailable)
                } else {
                    SpartanvilleError::Weather(WeatherError::RequestFailed(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            log_api_error("weather", &format!("HTTP {}", status), None);
            return Err(SpartanvilleError::Weather(WeatherError::RequestFailed(
                format!("HTTP {}", status),
            )));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| SpartanvilleError::Weather(WeatherError::InvalidResponse(e.to_string())))?;

        let report = condense(&forecast)?;
        info!(
            temperature_f = report.current.temperature_f,
            condition = %report.current.condition,
            "Weather report fetched"
        );
        Ok(report)
    }

    async fn cached_report(&self) -> Result<Option<WeatherReport>> {
        let Some(redis_client) = &self.redis_client else {
            return Ok(None);
        };

        let mut conn = redis_client.get_async_connection().await?;
        let cache_key = self.cache_key();

        let cached: Option<String> = conn.get(&cache_key).await?;
        if let Some(data) = cached {
            match serde_json::from_str::<WeatherReport>(&data) {
                Ok(report) => {
                    let age = chrono::Utc::now() - report.fetched_at;
                    let max_age = (self.settings.weather.refresh_minutes * 60) as i64;
                    if age.num_seconds() < max_age {
                        return Ok(Some(report));
                    }
                    let _: () = conn.del(&cache_key).await?;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize cached weather report");
                    let _: () = conn.del(&cache_key).await?;
                }
            }
        }

        Ok(None)
    }

    async fn cache_report(&self, report: &WeatherReport) -> Result<()> {
        let Some(redis_client) = &self.redis_client else {
            return Ok(());
        };

        let mut conn = redis_client.get_async_connection().await?;
        let serialized = serde_json::to_string(report)?;
        let ttl = self.settings.weather.refresh_minutes * 60;

        let _: () = conn.set_ex(self.cache_key(), serialized, ttl).await?;
        debug!("Weather report cached");
        Ok(())
    }

    fn cache_key(&self) -> String {
        format!("{}weather:report", self.settings.redis.prefix)
    }

    /// Check if the weather feature is enabled
    pub fn is_enabled(&self) -> bool {
        self.settings.features.weather
    }
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("cached", &self.redis_client.is_some())
            .finish_non_exhaustive()
    }
}

/// Condense the raw hourly arrays into the displayed report
fn condense(forecast: &ForecastResponse) -> WeatherResult<WeatherReport> {
    let observed_at = NaiveDateTime::parse_from_str(&forecast.current.time, TIME_FORMAT)
        .map_err(|e| WeatherError::InvalidResponse(format!("bad current time: {}", e)))?;
    let current_hour = observed_at
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(observed_at);

    // Hour slots are local-time ISO strings; find the slot for the current hour
    let start = forecast
        .hourly
        .time
        .iter()
        .position(|t| {
            NaiveDateTime::parse_from_str(t, TIME_FORMAT)
                .map(|parsed| parsed >= current_hour)
                .unwrap_or(false)
        })
        .ok_or_else(|| WeatherError::InvalidResponse("no hourly slot for current time".to_string()))?;

    let mut hourly = Vec::with_capacity(FORECAST_HOURS);
    for index in start..(start + FORECAST_HOURS) {
        let (Some(time), Some(temperature), Some(probability)) = (
            forecast.hourly.time.get(index),
            forecast.hourly.temperature_2m.get(index),
            forecast.hourly.precipitation_probability.get(index),
        ) else {
            break;
        };

        let parsed = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|e| WeatherError::InvalidResponse(format!("bad hourly time: {}", e)))?;

        hourly.push(HourlyForecast {
            label: parsed.format("%-I %p").to_string(),
            temperature_f: temperature.round() as i64,
            precipitation_probability: *probability,
        });
    }

    if hourly.is_empty() {
        return Err(WeatherError::InvalidResponse(
            "hourly forecast is empty".to_string(),
        ));
    }

    let current_probability = hourly[0].precipitation_probability;

    Ok(WeatherReport {
        current: CurrentConditions {
            temperature_f: forecast.current.temperature_2m.round() as i64,
            condition: WeatherCondition::from_precipitation(current_probability),
        },
        hourly,
        fetched_at: chrono::Utc::now(),
    })
}
