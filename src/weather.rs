//! Weather API client for Open-Meteo integration
//!
//! HTTP client functionality for retrieving hourly forecast data and
//! geocoding results from the Open-Meteo API, with rate limiting, retry
//! logic and response caching. Open-Meteo requires no API key.

use crate::MudcastError;
use crate::cache;
use crate::config::MudcastConfig;
use crate::models::{HourlyRecord, Location, WeatherForecast};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Rate limiter for API requests
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per minute
    max_requests_per_minute: u32,
    /// Request timestamps within the current minute
    request_times: Vec<Instant>,
    /// Last cleanup time
    last_cleanup: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute,
            request_times: Vec::new(),
            last_cleanup: Instant::now(),
        }
    }

    /// Check if a request is allowed and record it
    pub fn allow_request(&mut self) -> bool {
        self.cleanup_old_requests();

        if self.request_times.len() >= self.max_requests_per_minute as usize {
            false
        } else {
            self.request_times.push(Instant::now());
            true
        }
    }

    /// Get time until next request is allowed
    pub fn time_until_next_request(&mut self) -> Duration {
        self.cleanup_old_requests();

        if self.request_times.len() < self.max_requests_per_minute as usize {
            Duration::from_secs(0)
        } else if let Some(oldest) = self.request_times.first() {
            let elapsed = oldest.elapsed();
            if elapsed >= Duration::from_secs(60) {
                Duration::from_secs(0)
            } else {
                Duration::from_secs(60) - elapsed
            }
        } else {
            Duration::from_secs(0)
        }
    }

    /// Remove requests older than 1 minute
    fn cleanup_old_requests(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_cleanup) >= Duration::from_secs(10) {
            let cutoff = now - Duration::from_secs(60);
            self.request_times.retain(|&time| time > cutoff);
            self.last_cleanup = now;
        }
    }
}

/// Weather API client for Open-Meteo
pub struct WeatherApiClient {
    /// HTTP client
    client: Client,
    /// API configuration
    config: MudcastConfig,
    /// Rate limiter
    rate_limiter: Mutex<RateLimiter>,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: MudcastConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mudcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        // Open-Meteo free tier allows 600 requests per minute; stay well below
        let rate_limiter = Mutex::new(RateLimiter::new(60));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Underlying HTTP client, shared with other upstream lookups
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Get an hourly forecast for a location, including past days.
    ///
    /// `past_days` overrides the configured lookback when given. Results
    /// are cached per rounded coordinate and day window.
    #[instrument(skip(self, location), fields(name = %location.name))]
    pub async fn get_forecast(
        &self,
        location: &Location,
        past_days: Option<u32>,
    ) -> Result<WeatherForecast> {
        let past_days = past_days.unwrap_or(self.config.weather.past_days).min(92);
        let forecast_days = self.config.weather.forecast_days;

        let cache_key = location.cache_key(past_days, forecast_days);
        if let Some(cached) = cache::get::<WeatherForecast>(&cache_key).await? {
            debug!("Forecast served from cache");
            return Ok(cached);
        }

        info!(
            "Getting forecast for {:.4}, {:.4} ({} past days)",
            location.latitude, location.longitude, past_days
        );
        let start_time = Instant::now();

        let url = format!(
            "{}/forecast?latitude={}&longitude={}&hourly=temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,rain&timezone=auto&past_days={}&forecast_days={}",
            self.config.weather.base_url,
            location.latitude,
            location.longitude,
            past_days,
            forecast_days
        );

        let response = self.make_request(&url).await?;

        let forecast_response: openmeteo::ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo forecast response")
            .map_err(|e| {
                error!("Failed to parse forecast response: {}", e);
                MudcastError::api("Invalid forecast data received from Open-Meteo API")
            })?;

        let forecast = WeatherForecast::from_openmeteo(&forecast_response, location.clone());

        info!(
            "Retrieved forecast with {} data points in {:.3}s",
            forecast.hourly.len(),
            start_time.elapsed().as_secs_f64()
        );

        let ttl = Duration::from_secs(u64::from(self.config.cache.ttl_hours) * 3600);
        cache::put(&cache_key, forecast.clone(), ttl).await?;

        Ok(forecast)
    }

    /// Get geocoding information for a location name
    #[instrument(skip(self))]
    pub async fn geocode(&self, location_name: &str) -> Result<Vec<Location>> {
        info!("Geocoding location: '{}'", location_name);

        let url = format!(
            "{}/search?name={}&count=5&language=en&format=json",
            self.config.weather.geocoding_url,
            urlencoding::encode(location_name)
        );

        let response = self.make_request(&url).await?;

        let openmeteo_response: openmeteo::GeocodingResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo geocoding response")
            .map_err(|e| {
                error!("Failed to parse geocoding response: {}", e);
                MudcastError::api("Invalid geocoding data received from Open-Meteo API")
            })?;

        let locations: Vec<Location> = openmeteo_response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(Location::from)
            .collect();

        if locations.is_empty() {
            warn!("No results found for location '{}'", location_name);
        }

        Ok(locations)
    }

    /// Resolve free-form location input to a concrete coordinate.
    pub async fn resolve(&self, input: &LocationInput) -> Result<Location> {
        match input {
            LocationInput::Coordinates(lat, lon) => Ok(Location::new(
                *lat,
                *lon,
                format!("{lat:.4}, {lon:.4}"),
            )),
            LocationInput::Name(name) => {
                let mut results = self.geocode(name).await?;
                if results.is_empty() {
                    return Err(MudcastError::validation(format!(
                        "no location found for '{name}'"
                    ))
                    .into());
                }
                Ok(results.remove(0))
            }
        }
    }

    /// Make a request with rate limiting and retry logic
    async fn make_request(&self, url: &str) -> Result<Response> {
        let mut attempt = 0;
        let max_attempts = self.config.weather.max_retries + 1;

        debug!("Starting HTTP request (max attempts: {})", max_attempts);

        loop {
            // Rate limiting; the lock never crosses an await point
            let wait_time = {
                let mut limiter = self
                    .rate_limiter
                    .lock()
                    .map_err(|_| anyhow!("rate limiter lock poisoned"))?;
                if limiter.allow_request() {
                    None
                } else {
                    Some(limiter.time_until_next_request())
                }
            };

            if let Some(wait) = wait_time {
                warn!("Rate limit exceeded, waiting {:.1}s", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
                continue;
            }

            let attempt_start = Instant::now();
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "HTTP response received: {} in {:.3}s",
                        status,
                        attempt_start.elapsed().as_secs_f64()
                    );

                    if status.is_success() {
                        return Ok(response);
                    } else if status.as_u16() == 404 {
                        warn!("Location not found (HTTP 404)");
                        return Err(MudcastError::api(
                            "Location not found. Please check the coordinates or location name.",
                        )
                        .into());
                    } else if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|h| h.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(60);

                        warn!(
                            "Server rate limit exceeded (HTTP 429), retry after {}s",
                            retry_after
                        );

                        if attempt < max_attempts - 1 {
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        error!("Rate limit exceeded and retry attempts exhausted");
                        return Err(MudcastError::api(
                            "Rate limit exceeded and retry attempts exhausted.",
                        )
                        .into());
                    } else {
                        let error_msg = format!(
                            "API request failed with status: {} - {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown error")
                        );

                        warn!("HTTP error on attempt {}: {}", attempt + 1, error_msg);

                        if attempt < max_attempts - 1 {
                            let backoff = Duration::from_millis(1000 * 2_u64.pow(attempt));
                            debug!("Exponential backoff: waiting {:.1}s", backoff.as_secs_f64());
                            tokio::time::sleep(backoff).await;
                            attempt += 1;
                            continue;
                        }
                        error!("API request failed after all attempts: {}", error_msg);
                        return Err(MudcastError::api(error_msg).into());
                    }
                }
                Err(e) => {
                    warn!(
                        "Network error on attempt {} ({:.3}s): {}",
                        attempt + 1,
                        attempt_start.elapsed().as_secs_f64(),
                        e
                    );

                    if attempt < max_attempts - 1 {
                        let backoff = Duration::from_millis(1000 * 2_u64.pow(attempt));
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    error!("Network error after {} attempts: {}", max_attempts, e);
                    return Err(MudcastError::api(format!(
                        "Network error after {max_attempts} attempts: {e}"
                    ))
                    .into());
                }
            }
        }
    }
}

/// Types of location input accepted by the CLI and dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, etc.)
    Name(String),
}

impl LocationInput {
    /// Parse free-form input: "lat,lon" pairs become coordinates,
    /// everything else is treated as a place name.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MudcastError::validation("location cannot be empty").into());
        }

        if let Ok((lat, lon)) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(lat, lon));
        }

        Ok(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from a string like "-35.06,-59.04" or "-35.06 -59.04"
    fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(
                MudcastError::validation("Coordinates must be in format 'lat,lon'").into(),
            );
        }

        let lat = parts[0]
            .parse::<f64>()
            .with_context(|| format!("Invalid latitude: {}", parts[0]))?;
        let lon = parts[1]
            .parse::<f64>()
            .with_context(|| format!("Invalid longitude: {}", parts[1]))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(MudcastError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(MudcastError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            ))
            .into());
        }

        Ok((lat, lon))
    }
}

/// Open-Meteo API response structures and conversion utilities
pub mod openmeteo {
    use super::{HourlyRecord, Location, WeatherForecast};
    use chrono::Utc;
    use serde::Deserialize;

    /// Forecast response from the Open-Meteo API
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub latitude: f64,
        pub longitude: f64,
        pub timezone: Option<String>,
        pub hourly: Option<HourlyData>,
    }

    /// Hourly weather arrays from Open-Meteo
    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<Vec<Option<f32>>>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: Option<Vec<Option<f32>>>,
        pub precipitation_probability: Option<Vec<Option<f32>>>,
        pub precipitation: Option<Vec<Option<f32>>>,
        pub rain: Option<Vec<Option<f32>>>,
    }

    /// Geocoding response from Open-Meteo
    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub admin1: Option<String>,
    }

    impl From<GeocodingResult> for Location {
        fn from(result: GeocodingResult) -> Self {
            let name = if let Some(admin1) = result.admin1 {
                format!("{}, {}", result.name, admin1)
            } else {
                result.name
            };

            Location {
                latitude: result.latitude,
                longitude: result.longitude,
                name,
                country: result.country,
            }
        }
    }

    fn series_value(series: &Option<Vec<Option<f32>>>, index: usize) -> f32 {
        series
            .as_ref()
            .and_then(|values| values.get(index))
            .and_then(|value| *value)
            .unwrap_or(0.0)
    }

    // Convert Open-Meteo API responses to internal models
    impl WeatherForecast {
        /// Create forecast from an Open-Meteo API response.
        ///
        /// Timestamps come back local to the requested timezone; hours
        /// with unparseable timestamps are skipped, missing array values
        /// default to zero.
        #[must_use]
        pub fn from_openmeteo(response: &ForecastResponse, location: Location) -> Self {
            let mut records = Vec::new();

            if let Some(hourly) = &response.hourly {
                for (i, time) in hourly.time.iter().enumerate() {
                    let timestamp = match chrono::NaiveDateTime::parse_from_str(
                        time,
                        "%Y-%m-%dT%H:%M",
                    ) {
                        Ok(dt) => dt.and_utc(),
                        Err(_) => {
                            tracing::warn!("Skipping unparseable timestamp '{}'", time);
                            continue;
                        }
                    };

                    records.push(HourlyRecord {
                        timestamp,
                        temperature: series_value(&hourly.temperature, i),
                        relative_humidity: series_value(&hourly.relative_humidity, i),
                        precipitation_probability: series_value(
                            &hourly.precipitation_probability,
                            i,
                        ),
                        precipitation: series_value(&hourly.precipitation, i),
                        rain: series_value(&hourly.rain, i),
                    });
                }
            }

            Self {
                location,
                hourly: records,
                retrieved_at: Utc::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter() {
        let mut limiter = RateLimiter::new(2);

        // Should allow first 2 requests
        assert!(limiter.allow_request());
        assert!(limiter.allow_request());

        // Should deny 3rd request
        assert!(!limiter.allow_request());

        // Check time until next request
        let wait_time = limiter.time_until_next_request();
        assert!(wait_time > Duration::from_secs(0));
    }

    #[test]
    fn test_location_input_coordinates() {
        assert_eq!(
            LocationInput::parse("-35.0610,-59.0425").unwrap(),
            LocationInput::Coordinates(-35.0610, -59.0425)
        );

        assert_eq!(
            LocationInput::parse("-35.0610 -59.0425").unwrap(),
            LocationInput::Coordinates(-35.0610, -59.0425)
        );
    }

    #[test]
    fn test_location_input_invalid_coordinates_fall_back_to_name() {
        assert!(matches!(
            LocationInput::parse("91.0,8.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationInput::parse("46.0,-181.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationInput::parse("46.0,8.0,0.0").unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_location_input_names() {
        assert!(matches!(
            LocationInput::parse("Zapiola").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationInput::parse("San Antonio de Areco").unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_location_input_empty_is_an_error() {
        assert!(LocationInput::parse("").is_err());
        assert!(LocationInput::parse("   ").is_err());
    }

    #[test]
    fn test_geocoding_result_to_location() {
        let result = openmeteo::GeocodingResult {
            name: "Zapiola".to_string(),
            latitude: -35.061,
            longitude: -59.0425,
            country: Some("AR".to_string()),
            admin1: Some("Buenos Aires".to_string()),
        };

        let location: Location = result.into();
        assert_eq!(location.name, "Zapiola, Buenos Aires");
        assert_eq!(location.latitude, -35.061);
        assert_eq!(location.country, Some("AR".to_string()));
    }

    #[test]
    fn test_forecast_parsing_from_fixture() {
        let fixture = r#"{
            "latitude": -35.0,
            "longitude": -59.0,
            "timezone": "America/Argentina/Buenos_Aires",
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T02:00"],
                "temperature_2m": [12.5, 12.0, null],
                "relative_humidity_2m": [88.0, 90.0, 91.0],
                "precipitation_probability": [10.0, 20.0, 30.0],
                "precipitation": [0.0, 1.5, 0.5],
                "rain": [0.0, 1.5, 0.5]
            }
        }"#;

        let response: openmeteo::ForecastResponse = serde_json::from_str(fixture).unwrap();
        let location = Location::new(-35.0, -59.0, "Test".to_string());
        let forecast = WeatherForecast::from_openmeteo(&response, location);

        assert_eq!(forecast.hourly.len(), 3);
        assert_eq!(forecast.hourly[0].temperature, 12.5);
        assert_eq!(forecast.hourly[1].rain, 1.5);
        // Missing values default to zero
        assert_eq!(forecast.hourly[2].temperature, 0.0);

        let daily = forecast.daily_summaries();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].rain, 2.0);
    }

    #[test]
    fn test_forecast_parsing_skips_bad_timestamps() {
        let fixture = r#"{
            "latitude": -35.0,
            "longitude": -59.0,
            "timezone": null,
            "hourly": {
                "time": ["not-a-date", "2024-05-01T01:00"],
                "temperature_2m": [1.0, 2.0],
                "relative_humidity_2m": [50.0, 50.0],
                "precipitation_probability": [0.0, 0.0],
                "precipitation": [0.0, 0.0],
                "rain": [0.0, 0.0]
            }
        }"#;

        let response: openmeteo::ForecastResponse = serde_json::from_str(fixture).unwrap();
        let location = Location::new(-35.0, -59.0, "Test".to_string());
        let forecast = WeatherForecast::from_openmeteo(&response, location);

        assert_eq!(forecast.hourly.len(), 1);
        assert_eq!(forecast.hourly[0].temperature, 2.0);
    }

    #[test]
    fn test_forecast_without_hourly_block_is_empty() {
        let fixture = r#"{"latitude": -35.0, "longitude": -59.0, "timezone": null, "hourly": null}"#;
        let response: openmeteo::ForecastResponse = serde_json::from_str(fixture).unwrap();
        let location = Location::new(-35.0, -59.0, "Test".to_string());
        let forecast = WeatherForecast::from_openmeteo(&response, location);
        assert!(forecast.hourly.is_empty());
    }
}
