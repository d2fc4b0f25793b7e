//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(latitude: f64, longitude: f64, name: String, country: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: Some(country),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate forecast cache key for this location
    #[must_use]
    pub fn cache_key(&self, past_days: u32, forecast_days: u32) -> String {
        let (lat, lon) = self.rounded_coordinates(2);
        format!("weather:{lat:.2}:{lon:.2}:{past_days}:{forecast_days}")
    }

    /// Generate road surface cache key for this location
    #[must_use]
    pub fn surface_cache_key(&self) -> String {
        let (lat, lon) = self.rounded_coordinates(4);
        format!("surface:{lat:.4}:{lon:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_cache_key() {
        let location = Location::new(-35.060995, -59.042510, "Zapiola".to_string());
        let key = location.cache_key(30, 7);
        assert_eq!(key, "weather:-35.06:-59.04:30:7");
    }

    #[test]
    fn test_location_rounded_coordinates() {
        let location = Location::new(-35.068_234, -59.047_456, "Test".to_string());
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, -35.07);
        assert_eq!(lon, -59.05);
    }

    #[test]
    fn test_surface_cache_key_uses_finer_rounding() {
        let location = Location::new(-35.068_234, -59.047_456, "Test".to_string());
        assert_eq!(location.surface_cache_key(), "surface:-35.0682:-59.0475");
    }
}
