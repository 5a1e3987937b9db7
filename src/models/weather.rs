//! Weather model

use serde::{Deserialize, Serialize};

/// Sky condition derived from precipitation probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Sunny,
    PartlyCloudy,
    Rainy,
}

impl WeatherCondition {
    /// Derive the condition from a precipitation probability percentage
    pub fn from_precipitation(probability: i64) -> Self {
        if probability > 30 {
            WeatherCondition::Rainy
        } else if probability > 10 {
            WeatherCondition::PartlyCloudy
        } else {
            WeatherCondition::Sunny
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherCondition::Sunny => write!(f, "Sunny"),
            WeatherCondition::PartlyCloudy => write!(f, "Partly Cloudy"),
            WeatherCondition::Rainy => write!(f, "Rainy"),
        }
    }
}

/// Current conditions at the campus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_f: i64,
    pub condition: WeatherCondition,
}

/// Forecast for a single upcoming hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub label: String,
    pub temperature_f: i64,
    pub precipitation_probability: i64,
}

/// Condensed campus weather report: current conditions plus the next hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_thresholds() {
        assert_eq!(WeatherCondition::from_precipitation(0), WeatherCondition::Sunny);
        assert_eq!(WeatherCondition::from_precipitation(10), WeatherCondition::Sunny);
        assert_eq!(
            WeatherCondition::from_precipitation(11),
            WeatherCondition::PartlyCloudy
        );
        assert_eq!(
            WeatherCondition::from_precipitation(30),
            WeatherCondition::PartlyCloudy
        );
        assert_eq!(WeatherCondition::from_precipitation(31), WeatherCondition::Rainy);
    }
}
