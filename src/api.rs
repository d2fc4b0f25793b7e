//! Dashboard JSON API
//!
//! Endpoints consumed by the web frontend: preset locations, raw
//! forecast data, and the classified road status with its calendar view
//! and next-dry-day prediction.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MudcastConfig;
use crate::error::MudcastError;
use crate::models::{DailyRecord, HourlyRecord, Location, WeatherForecast};
use crate::road::{self, MonthGrid, RoadStatus};
use crate::surface::{self, RoadSurface};
use crate::weather::WeatherApiClient;

/// Shared state for all API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MudcastConfig>,
    pub weather: Arc<WeatherApiClient>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<MudcastConfig>, weather: Arc<WeatherApiClient>) -> Self {
        Self { config, weather }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Override the configured lookback window
    pub past_days: Option<u32>,
    /// Optional display name for the coordinate
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct ApiLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct ForecastPayload {
    pub location: Location,
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyRecord>,
}

/// One classified day for the dashboard tables
#[derive(Debug, Serialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub status: RoadStatus,
    pub rain: f32,
    pub relative_humidity: f32,
}

#[derive(Serialize)]
pub struct RoadStatusPayload {
    pub location: Location,
    pub daily: Vec<DayStatus>,
    /// Condition of the most recent day in the series
    pub current: RoadStatus,
    /// First day at or after today predicted to be dry
    pub next_dry_day: Option<NaiveDate>,
    /// Month grids for the calendar view
    pub calendar: Vec<MonthGrid>,
    /// Surface of the nearest road, when the lookup succeeded
    pub surface: Option<RoadSurface>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/locations", get(get_locations))
        .route("/forecast", get(get_forecast))
        .route("/road-status", get(get_road_status))
        .with_state(state)
}

async fn get_locations(State(state): State<AppState>) -> Json<Vec<ApiLocation>> {
    let locations = state
        .config
        .locations
        .iter()
        .map(|preset| ApiLocation {
            name: preset.name.clone(),
            latitude: preset.latitude,
            longitude: preset.longitude,
        })
        .collect();
    Json(locations)
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastPayload>, StatusCode> {
    let location = query_location(&query).map_err(|err| handle_error(&err))?;

    let forecast = state
        .weather
        .get_forecast(&location, query.past_days)
        .await
        .map_err(|err| handle_error(&err))?;

    let daily = forecast.daily_summaries();
    Ok(Json(ForecastPayload {
        location,
        hourly: forecast.hourly,
        daily,
    }))
}

async fn get_road_status(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<RoadStatusPayload>, StatusCode> {
    let location = query_location(&query).map_err(|err| handle_error(&err))?;

    let forecast = state
        .weather
        .get_forecast(&location, query.past_days)
        .await
        .map_err(|err| handle_error(&err))?;

    // A failed surface lookup degrades the response instead of failing it
    let surface =
        match surface::get_road_surface(state.weather.http(), &state.config, &location).await {
            Ok(surface) => Some(surface),
            Err(err) => {
                warn!("Road surface lookup failed: {err:#}");
                None
            }
        };

    let payload = build_road_status(
        &state.config,
        &forecast,
        surface,
        Utc::now().date_naive(),
    )
    .map_err(|err| handle_error(&err))?;

    Ok(Json(payload))
}

/// Assemble the road status payload from a forecast.
///
/// Pure except for the inputs, so the dashboard response shape is
/// testable without a server.
pub fn build_road_status(
    config: &MudcastConfig,
    forecast: &WeatherForecast,
    surface: Option<RoadSurface>,
    today: NaiveDate,
) -> anyhow::Result<RoadStatusPayload> {
    let params = config.road.estimator_params();
    let daily = forecast.daily_summaries();

    let statuses = road::classify(&daily, &params)?;
    let current = road::current_status(&daily, &params)?;

    // The series usually starts in the past; never predict before today
    let from_date = daily
        .first()
        .map(|first| today.max(first.date))
        .unwrap_or(today);
    let next_dry_day = road::next_dry_day(&daily, &params, from_date)?;

    let classified: Vec<(NaiveDate, RoadStatus)> = daily
        .iter()
        .zip(&statuses)
        .map(|(record, status)| (record.date, *status))
        .collect();
    let calendar = road::month_grids(&classified);

    let day_statuses = daily
        .iter()
        .zip(&statuses)
        .map(|(record, status)| DayStatus {
            date: record.date,
            status: *status,
            rain: record.rain,
            relative_humidity: record.relative_humidity,
        })
        .collect();

    Ok(RoadStatusPayload {
        location: forecast.location.clone(),
        daily: day_statuses,
        current,
        next_dry_day,
        calendar,
        surface,
    })
}

fn query_location(query: &ForecastQuery) -> anyhow::Result<Location> {
    if !(-90.0..=90.0).contains(&query.latitude) {
        return Err(MudcastError::validation(format!(
            "latitude {} outside [-90, 90]",
            query.latitude
        ))
        .into());
    }
    if !(-180.0..=180.0).contains(&query.longitude) {
        return Err(MudcastError::validation(format!(
            "longitude {} outside [-180, 180]",
            query.longitude
        ))
        .into());
    }

    let name = query
        .name
        .clone()
        .unwrap_or_else(|| format!("{:.4}, {:.4}", query.latitude, query.longitude));
    Ok(Location::new(query.latitude, query.longitude, name))
}

fn handle_error(err: &anyhow::Error) -> StatusCode {
    warn!("API request failed: {err:#}");
    status_for(err)
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<MudcastError>() {
        Some(MudcastError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(MudcastError::Api { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
