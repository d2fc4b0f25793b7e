//! Data models for the Mudcast application
//!
//! Core domain models organized by concern:
//! - Location: geographic coordinates and metadata
//! - Weather: hourly observations from the forecast provider
//! - Forecast: forecast series and daily aggregation

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{DailyRecord, WeatherForecast};
pub use location::Location;
pub use weather::HourlyRecord;
