//! Weather forecast model and daily aggregation

use super::{HourlyRecord, Location};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weather forecast containing hourly data points for one location
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeatherForecast {
    /// Location for this forecast
    pub location: Location,
    /// Hourly data points (sorted by timestamp)
    pub hourly: Vec<HourlyRecord>,
    /// When this forecast was retrieved
    pub retrieved_at: DateTime<Utc>,
}

/// Daily summary aggregated from hourly records
///
/// Temperatures, humidity and precipitation probability are daily means;
/// precipitation and rain are daily sums.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyRecord {
    /// Calendar date for this summary
    pub date: NaiveDate,
    /// Mean temperature in Celsius
    pub temperature: f32,
    /// Mean relative humidity in percent
    pub relative_humidity: f32,
    /// Mean precipitation probability in percent
    pub precipitation_probability: f32,
    /// Total precipitation in mm
    pub precipitation: f32,
    /// Total rain in mm
    pub rain: f32,
}

impl WeatherForecast {
    /// Create new forecast
    #[must_use]
    pub fn new(location: Location, hourly: Vec<HourlyRecord>) -> Self {
        Self {
            location,
            hourly,
            retrieved_at: Utc::now(),
        }
    }

    /// Get current weather (first hourly item)
    #[must_use]
    pub fn current_weather(&self) -> Option<&HourlyRecord> {
        self.hourly.first()
    }

    /// Aggregate the hourly series into one record per calendar day.
    ///
    /// Days come out chronologically ascending. An empty forecast yields
    /// an empty vector.
    #[must_use]
    pub fn daily_summaries(&self) -> Vec<DailyRecord> {
        let mut by_day: BTreeMap<NaiveDate, Vec<&HourlyRecord>> = BTreeMap::new();
        for record in &self.hourly {
            by_day
                .entry(record.timestamp.date_naive())
                .or_default()
                .push(record);
        }

        by_day
            .into_iter()
            .map(|(date, records)| {
                let n = records.len() as f32;
                DailyRecord {
                    date,
                    temperature: records.iter().map(|r| r.temperature).sum::<f32>() / n,
                    relative_humidity: records.iter().map(|r| r.relative_humidity).sum::<f32>()
                        / n,
                    precipitation_probability: records
                        .iter()
                        .map(|r| r.precipitation_probability)
                        .sum::<f32>()
                        / n,
                    precipitation: records.iter().map(|r| r.precipitation).sum(),
                    rain: records.iter().map(|r| r.rain).sum(),
                }
            })
            .collect()
    }

    /// Check if forecast data is still fresh (not older than cache TTL)
    #[must_use]
    pub fn is_fresh(&self, ttl_hours: u32) -> bool {
        let age = Utc::now() - self.retrieved_at;
        age.num_hours() < i64::from(ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly(ts: DateTime<Utc>, temperature: f32, humidity: f32, rain: f32) -> HourlyRecord {
        HourlyRecord {
            timestamp: ts,
            temperature,
            relative_humidity: humidity,
            precipitation_probability: 0.0,
            precipitation: rain,
            rain,
        }
    }

    #[test]
    fn test_daily_aggregation_sums_and_means() {
        let location = Location::new(-35.06, -59.04, "Zapiola".to_string());
        let day1 = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 5, 2, 6, 0, 0).unwrap();

        let forecast = WeatherForecast::new(
            location,
            vec![
                hourly(day1, 10.0, 80.0, 1.0),
                hourly(day1 + chrono::Duration::hours(6), 20.0, 60.0, 3.0),
                hourly(day2, 15.0, 90.0, 0.0),
            ],
        );

        let daily = forecast.daily_summaries();
        assert_eq!(daily.len(), 2);

        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(daily[0].temperature, 15.0);
        assert_eq!(daily[0].relative_humidity, 70.0);
        assert_eq!(daily[0].rain, 4.0);

        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(daily[1].rain, 0.0);
    }

    #[test]
    fn test_daily_aggregation_orders_days() {
        let location = Location::new(-35.06, -59.04, "Zapiola".to_string());
        let day1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        // Hourly records out of order still aggregate into sorted days
        let forecast = WeatherForecast::new(
            location,
            vec![hourly(day2, 15.0, 50.0, 0.0), hourly(day1, 15.0, 50.0, 0.0)],
        );

        let daily = forecast.daily_summaries();
        assert_eq!(daily.len(), 2);
        assert!(daily[0].date < daily[1].date);
    }

    #[test]
    fn test_empty_forecast_aggregates_to_empty() {
        let location = Location::new(-35.06, -59.04, "Zapiola".to_string());
        let forecast = WeatherForecast::new(location, vec![]);
        assert!(forecast.daily_summaries().is_empty());
        assert!(forecast.current_weather().is_none());
    }

    #[test]
    fn test_forecast_freshness() {
        let location = Location::new(-35.06, -59.04, "Zapiola".to_string());
        let forecast = WeatherForecast::new(location, vec![]);
        assert!(forecast.is_fresh(1));
    }
}
