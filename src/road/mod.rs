//! Road condition estimation
//!
//! Classifies each day of a forecast series as dry or muddy and predicts
//! the next day the road will be passable. A day is wet when its rainfall
//! exceeds the configured threshold; after a wet day the road stays muddy
//! until enough consecutive non-wet days have elapsed, and (optionally)
//! until the mean humidity drops below the configured limit.
//!
//! The estimator is a pure function over its inputs: no I/O, no shared
//! state, bounded by the series length.

pub mod calendar;

pub use calendar::{DayCell, MonthGrid, month_grids};

use crate::error::MudcastError;
use crate::models::DailyRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-day road condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadStatus {
    /// The road has dried out and is passable
    Dry,
    /// Recent rain (or lingering humidity) keeps the surface muddy
    Muddy,
}

impl fmt::Display for RoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadStatus::Dry => write!(f, "Dry"),
            RoadStatus::Muddy => write!(f, "Muddy"),
        }
    }
}

impl RoadStatus {
    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            RoadStatus::Dry => "\u{1f7e2}",
            RoadStatus::Muddy => "\u{1f534}",
        }
    }
}

/// Tunable parameters for the road condition estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Daily rainfall above this many millimeters counts as a wet day
    pub wet_threshold_mm: f64,
    /// Consecutive non-wet days required before the road reverts to dry
    pub dry_after_days: u32,
    /// Mean humidity above this percentage keeps a recovering road muddy
    pub humidity_limit: Option<f64>,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            wet_threshold_mm: 5.0,
            dry_after_days: 2,
            humidity_limit: Some(90.0),
        }
    }
}

/// Classify every day of the series as dry or muddy.
///
/// Returns one status per input day, same length and order. An empty
/// series yields an empty result. The series must be chronologically
/// ascending without duplicate dates, and rainfall must be non-negative.
pub fn classify(
    series: &[DailyRecord],
    params: &EstimatorParams,
) -> crate::Result<Vec<RoadStatus>> {
    validate_series(series)?;

    let mut statuses = Vec::with_capacity(series.len());
    let mut recovering = false;
    let mut dry_streak: u32 = 0;

    for record in series {
        let wet = f64::from(record.rain) > params.wet_threshold_mm;

        let status = if wet {
            recovering = true;
            dry_streak = 0;
            RoadStatus::Muddy
        } else if recovering {
            dry_streak += 1;
            let too_humid = params
                .humidity_limit
                .is_some_and(|limit| f64::from(record.relative_humidity) > limit);

            if dry_streak < params.dry_after_days || too_humid {
                RoadStatus::Muddy
            } else {
                recovering = false;
                RoadStatus::Dry
            }
        } else {
            RoadStatus::Dry
        };

        statuses.push(status);
    }

    Ok(statuses)
}

/// Find the first day at or after `from_date` predicted to be dry.
///
/// Returns `None` when every remaining day stays muddy. Fails when the
/// series is empty or `from_date` precedes its first date.
pub fn next_dry_day(
    series: &[DailyRecord],
    params: &EstimatorParams,
    from_date: NaiveDate,
) -> crate::Result<Option<NaiveDate>> {
    let first = series.first().ok_or_else(|| {
        MudcastError::validation("cannot predict a dry day from an empty series")
    })?;

    if from_date < first.date {
        return Err(MudcastError::validation(format!(
            "reference date {} precedes the series start {}",
            from_date, first.date
        )));
    }

    let statuses = classify(series, params)?;

    Ok(series
        .iter()
        .zip(statuses)
        .find(|(record, status)| record.date >= from_date && *status == RoadStatus::Dry)
        .map(|(record, _)| record.date))
}

/// Road condition of the most recent day in the series.
pub fn current_status(
    series: &[DailyRecord],
    params: &EstimatorParams,
) -> crate::Result<RoadStatus> {
    let statuses = classify(series, params)?;
    statuses
        .last()
        .copied()
        .ok_or_else(|| MudcastError::validation("cannot determine status of an empty series"))
}

fn validate_series(series: &[DailyRecord]) -> crate::Result<()> {
    for record in series {
        if record.rain < 0.0 || record.precipitation < 0.0 {
            return Err(MudcastError::validation(format!(
                "negative rainfall on {}",
                record.date
            )));
        }
    }

    for pair in series.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(MudcastError::validation(format!(
                "series must be chronologically ascending without duplicates ({} then {})",
                pair[0].date, pair[1].date
            )));
        }
    }

    Ok(())
}
