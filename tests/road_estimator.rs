//! End-to-end tests: from a raw Open-Meteo response through daily
//! aggregation to road classification and the next-dry-day prediction.

use chrono::NaiveDate;
use rstest::rstest;

use mudcast::models::{DailyRecord, Location, WeatherForecast};
use mudcast::road::{self, EstimatorParams, RoadStatus};
use mudcast::weather::openmeteo;

fn record(date: &str, rain: f32, humidity: f32) -> DailyRecord {
    DailyRecord {
        date: date.parse().unwrap(),
        temperature: 15.0,
        relative_humidity: humidity,
        precipitation_probability: 0.0,
        precipitation: rain,
        rain,
    }
}

fn series(rain_per_day: &[f32]) -> Vec<DailyRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    rain_per_day
        .iter()
        .enumerate()
        .map(|(i, &rain)| DailyRecord {
            date: start + chrono::Duration::days(i as i64),
            temperature: 15.0,
            relative_humidity: 60.0,
            precipitation_probability: 0.0,
            precipitation: rain,
            rain,
        })
        .collect()
}

fn params(threshold: f64, dry_after: u32) -> EstimatorParams {
    EstimatorParams {
        wet_threshold_mm: threshold,
        dry_after_days: dry_after,
        humidity_limit: None,
    }
}

#[rstest]
#[case::all_dry(&[0.0, 0.0, 0.0], &[RoadStatus::Dry, RoadStatus::Dry, RoadStatus::Dry])]
#[case::all_wet(&[10.0, 10.0, 10.0], &[RoadStatus::Muddy, RoadStatus::Muddy, RoadStatus::Muddy])]
#[case::recovery(&[10.0, 0.0, 0.0, 0.0], &[RoadStatus::Muddy, RoadStatus::Muddy, RoadStatus::Dry, RoadStatus::Dry])]
#[case::at_threshold_is_dry(&[5.0], &[RoadStatus::Dry])]
#[case::above_threshold_is_wet(&[5.1], &[RoadStatus::Muddy])]
fn classify_cases(#[case] rain: &[f32], #[case] expected: &[RoadStatus]) {
    let statuses = road::classify(&series(rain), &params(5.0, 2)).unwrap();
    assert_eq!(statuses, expected);
}

#[rstest]
#[case::recovers_after_two_days(&[10.0, 0.0, 0.0, 0.0], Some(2))]
#[case::never_recovers(&[10.0, 10.0, 10.0, 10.0], None)]
#[case::dry_from_the_start(&[0.0, 0.0], Some(0))]
fn next_dry_day_cases(#[case] rain: &[f32], #[case] expected_offset: Option<i64>) {
    let series = series(rain);
    let from = series[0].date;

    let found = road::next_dry_day(&series, &params(5.0, 2), from).unwrap();
    let expected = expected_offset.map(|days| from + chrono::Duration::days(days));
    assert_eq!(found, expected);
}

#[test]
fn humidity_rule_matches_field_behavior() {
    // After a storm the rain stops, but fog keeps the humidity high; the
    // road only dries once the air does.
    let series = vec![
        record("2024-05-01", 12.0, 95.0),
        record("2024-05-02", 0.0, 96.0),
        record("2024-05-03", 0.0, 93.0),
        record("2024-05-04", 0.0, 70.0),
    ];

    let params = EstimatorParams::default();
    let statuses = road::classify(&series, &params).unwrap();

    assert_eq!(
        statuses,
        vec![
            RoadStatus::Muddy,
            RoadStatus::Muddy,
            RoadStatus::Muddy,
            RoadStatus::Dry,
        ]
    );

    let next = road::next_dry_day(&series, &params, series[0].date)
        .unwrap()
        .unwrap();
    assert_eq!(next, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
}

#[test]
fn from_raw_response_to_prediction() {
    // Two days of hourly data: a rainy first day, a dry second day
    let fixture = r#"{
        "latitude": -35.06,
        "longitude": -59.04,
        "timezone": "America/Argentina/Buenos_Aires",
        "hourly": {
            "time": [
                "2024-05-01T06:00", "2024-05-01T12:00", "2024-05-01T18:00",
                "2024-05-02T06:00", "2024-05-02T12:00", "2024-05-02T18:00",
                "2024-05-03T06:00", "2024-05-03T12:00", "2024-05-03T18:00",
                "2024-05-04T06:00", "2024-05-04T12:00", "2024-05-04T18:00"
            ],
            "temperature_2m": [10.0, 16.0, 13.0, 11.0, 17.0, 14.0, 12.0, 18.0, 15.0, 12.0, 18.0, 15.0],
            "relative_humidity_2m": [85.0, 70.0, 80.0, 75.0, 60.0, 70.0, 70.0, 55.0, 65.0, 70.0, 55.0, 65.0],
            "precipitation_probability": [90.0, 80.0, 60.0, 20.0, 10.0, 10.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0],
            "precipitation": [4.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "rain": [4.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        }
    }"#;

    let response: openmeteo::ForecastResponse = serde_json::from_str(fixture).unwrap();
    let location = Location::new(-35.06, -59.04, "Zapiola".to_string());
    let forecast = WeatherForecast::from_openmeteo(&response, location);

    let daily = forecast.daily_summaries();
    assert_eq!(daily.len(), 4);
    assert_eq!(daily[0].rain, 8.0);
    assert_eq!(daily[1].rain, 0.0);

    let params = EstimatorParams::default();
    let statuses = road::classify(&daily, &params).unwrap();
    assert_eq!(
        statuses,
        vec![
            RoadStatus::Muddy,
            RoadStatus::Muddy,
            RoadStatus::Dry,
            RoadStatus::Dry,
        ]
    );

    // Standing on the muddy first day, the road opens on day three
    let next = road::next_dry_day(&daily, &params, daily[0].date)
        .unwrap()
        .unwrap();
    assert_eq!(next, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
}

#[test]
fn prediction_respects_reference_date() {
    let series = series(&[0.0, 10.0, 0.0, 0.0, 0.0]);
    let params = params(5.0, 2);

    // From the start the very first day is already dry
    let from_start = road::next_dry_day(&series, &params, series[0].date).unwrap();
    assert_eq!(from_start, Some(series[0].date));

    // From the wet day the prediction must not point backwards
    let from_wet = road::next_dry_day(&series, &params, series[1].date)
        .unwrap()
        .unwrap();
    assert!(from_wet >= series[1].date);
    assert_eq!(from_wet, series[3].date);
}
