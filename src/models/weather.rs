//! Hourly weather data model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hourly observation from the forecast provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HourlyRecord {
    /// Timestamp for this observation
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity at 2m in percent (0-100)
    pub relative_humidity: f32,
    /// Precipitation probability in percent (0-100)
    pub precipitation_probability: f32,
    /// Total precipitation in mm
    pub precipitation: f32,
    /// Rain portion of precipitation in mm
    pub rain: f32,
}

impl HourlyRecord {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}\u{b0}C", self.temperature)
    }

    /// Format rainfall with unit
    #[must_use]
    pub fn format_rain(&self) -> String {
        format!("{:.1}mm", self.rain)
    }
}
