//! Calendar grid shaping for the road status history view
//!
//! Turns a list of (date, status) pairs into per-month week/weekday grids
//! the presentation layer can paint directly. Weeks start on Monday.

use super::RoadStatus;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classified day inside a month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    /// Day of month (1-31)
    pub day: u32,
    /// Road condition for that day
    pub status: RoadStatus,
}

/// Week-by-weekday grid of one calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthGrid {
    pub year: i32,
    /// Month number (1-12)
    pub month: u32,
    /// Six week rows of seven weekday columns, Monday first
    pub weeks: Vec<[Option<DayCell>; 7]>,
}

impl MonthGrid {
    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            weeks: vec![[None; 7]; 6],
        }
    }

    /// Number of days placed in this grid
    #[must_use]
    pub fn filled_days(&self) -> usize {
        self.weeks
            .iter()
            .flatten()
            .filter(|cell| cell.is_some())
            .count()
    }
}

/// Build one grid per calendar month covered by the classified days.
///
/// Months come out chronologically. Days missing from the input stay
/// `None` in the grid, so partial months render with gaps rather than
/// misplaced cells.
#[must_use]
pub fn month_grids(days: &[(NaiveDate, RoadStatus)]) -> Vec<MonthGrid> {
    let mut grids: BTreeMap<(i32, u32), MonthGrid> = BTreeMap::new();

    for &(date, status) in days {
        let key = (date.year(), date.month());
        let grid = grids
            .entry(key)
            .or_insert_with(|| MonthGrid::empty(key.0, key.1));

        let first_weekday = date
            .with_day(1)
            .map(|first| first.weekday().num_days_from_monday())
            .unwrap_or(0);

        let day = date.day();
        let row = ((day - 1 + first_weekday) / 7) as usize;
        let col = date.weekday().num_days_from_monday() as usize;

        grid.weeks[row][col] = Some(DayCell { day, status });
    }

    grids.into_values().collect()
}
