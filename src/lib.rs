//! `Mudcast` - dirt road condition forecasting from weather data
//!
//! This library provides the core functionality for fetching weather
//! forecasts, estimating whether a dirt road is dry or muddy, and
//! predicting the next passable day.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod road;
pub mod surface;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::MudcastConfig;
pub use error::MudcastError;
pub use models::{DailyRecord, HourlyRecord, Location, WeatherForecast};
pub use road::{EstimatorParams, RoadStatus};
pub use surface::RoadSurface;
pub use weather::WeatherApiClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MudcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
