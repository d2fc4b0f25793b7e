//! Configuration management for the `Mudcast` application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. The road
//! estimation thresholds and the preset location list live here so the
//! rest of the application never reads ambient state.

use crate::MudcastError;
use crate::road::EstimatorParams;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `Mudcast` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MudcastConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Road condition estimation parameters
    #[serde(default)]
    pub road: RoadConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Preset locations offered by the dashboard and CLI
    #[serde(default = "default_locations")]
    pub locations: Vec<PresetLocation>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Base URL for the Open-Meteo geocoding API
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// Days of past data to include in forecasts
    #[serde(default = "default_past_days")]
    pub past_days: u32,
    /// Days of forecast data to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

/// Road condition estimation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadConfig {
    /// Daily rainfall above this many millimeters makes a day "wet"
    #[serde(default = "default_wet_threshold")]
    pub wet_threshold_mm: f64,
    /// Consecutive non-wet days required before the road reverts to dry
    #[serde(default = "default_dry_after_days")]
    pub dry_after_days: u32,
    /// Mean humidity above this percentage keeps a recovering road muddy
    #[serde(default = "default_humidity_limit")]
    pub humidity_limit_pct: Option<f64>,
    /// Base URL for the Overpass API used for road surface lookups
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    /// Search radius in meters around the coordinate for the surface lookup
    #[serde(default = "default_surface_radius")]
    pub surface_radius_m: u32,
}

impl RoadConfig {
    /// Estimator parameters derived from this configuration
    #[must_use]
    pub fn estimator_params(&self) -> EstimatorParams {
        EstimatorParams {
            wet_threshold_mm: self.wet_threshold_mm,
            dry_after_days: self.dry_after_days,
            humidity_limit: self.humidity_limit_pct,
        }
    }
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Weather cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Road surface cache TTL in days (surfaces rarely change)
    #[serde(default = "default_surface_ttl")]
    pub surface_ttl_days: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// A named location offered as a dashboard preset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetLocation {
    /// Display name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_past_days() -> u32 {
    30
}

fn default_forecast_days() -> u32 {
    7
}

fn default_wet_threshold() -> f64 {
    5.0
}

fn default_dry_after_days() -> u32 {
    2
}

fn default_humidity_limit() -> Option<f64> {
    Some(90.0)
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_surface_radius() -> u32 {
    15
}

fn default_cache_ttl() -> u32 {
    1
}

fn default_surface_ttl() -> u32 {
    30
}

fn default_cache_location() -> String {
    "~/.cache/mudcast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_locations() -> Vec<PresetLocation> {
    vec![
        PresetLocation {
            name: "Uri Land".to_string(),
            latitude: -35.081202,
            longitude: -59.033928,
        },
        PresetLocation {
            name: "Zapiola".to_string(),
            latitude: -35.060995,
            longitude: -59.042510,
        },
        PresetLocation {
            name: "Areco".to_string(),
            latitude: -34.256575,
            longitude: -59.487683,
        },
        PresetLocation {
            name: "Campana".to_string(),
            latitude: -34.177675,
            longitude: -58.966298,
        },
    ]
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            geocoding_url: default_geocoding_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
            past_days: default_past_days(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            wet_threshold_mm: default_wet_threshold(),
            dry_after_days: default_dry_after_days(),
            humidity_limit_pct: default_humidity_limit(),
            overpass_url: default_overpass_url(),
            surface_radius_m: default_surface_radius(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_cache_ttl(),
            surface_ttl_days: default_surface_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MudcastConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            road: RoadConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            locations: default_locations(),
        }
    }
}

impl MudcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with MUDCAST_ prefix,
        // e.g. MUDCAST_ROAD__WET_THRESHOLD_MM=10
        builder = builder.add_source(
            Environment::with_prefix("MUDCAST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: MudcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mudcast").join("config.toml"))
    }

    /// Find a preset location by name, case-insensitively
    #[must_use]
    pub fn find_preset(&self, name: &str) -> Option<&PresetLocation> {
        self.locations
            .iter()
            .find(|loc| loc.name.eq_ignore_ascii_case(name))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_locations()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(MudcastError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.weather.max_retries > 10 {
            return Err(MudcastError::config("Weather API max retries cannot exceed 10").into());
        }

        // Open-Meteo caps historic lookback at 92 days and forecasts at 16
        if self.weather.past_days > 92 {
            return Err(MudcastError::config("Past days cannot exceed 92").into());
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > 16 {
            return Err(
                MudcastError::config("Forecast days must be between 1 and 16").into(),
            );
        }

        if self.road.wet_threshold_mm < 0.0 {
            return Err(MudcastError::config("Wet threshold cannot be negative").into());
        }

        if self.road.dry_after_days > 30 {
            return Err(MudcastError::config("Dry-after days cannot exceed 30").into());
        }

        if let Some(limit) = self.road.humidity_limit_pct {
            if !(0.0..=100.0).contains(&limit) {
                return Err(MudcastError::config(
                    "Humidity limit must be between 0 and 100 percent",
                )
                .into());
            }
        }

        if self.road.surface_radius_m == 0 || self.road.surface_radius_m > 1000 {
            return Err(MudcastError::config(
                "Surface search radius must be between 1 and 1000 meters",
            )
            .into());
        }

        if self.cache.ttl_hours == 0 || self.cache.ttl_hours > 168 {
            return Err(
                MudcastError::config("Cache TTL must be between 1 and 168 hours").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MudcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MudcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [
            &self.weather.base_url,
            &self.weather.geocoding_url,
            &self.road.overpass_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MudcastError::config(format!(
                    "'{url}' is not a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.cache.location.is_empty() {
            return Err(MudcastError::config("Cache location cannot be empty").into());
        }

        Ok(())
    }

    /// Validate the preset location list
    fn validate_locations(&self) -> Result<()> {
        for loc in &self.locations {
            if loc.name.trim().is_empty() {
                return Err(MudcastError::config("Preset location name cannot be empty").into());
            }
            if !(-90.0..=90.0).contains(&loc.latitude) {
                return Err(MudcastError::config(format!(
                    "Preset '{}' has latitude {} outside [-90, 90]",
                    loc.name, loc.latitude
                ))
                .into());
            }
            if !(-180.0..=180.0).contains(&loc.longitude) {
                return Err(MudcastError::config(format!(
                    "Preset '{}' has longitude {} outside [-180, 180]",
                    loc.name, loc.longitude
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Resolve the cache directory, expanding a leading `~`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        let raw = &self.cache.location;
        if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(raw)
    }
}
