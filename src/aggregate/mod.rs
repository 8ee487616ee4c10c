//! Per-day and per-year bucketing of raw reading-time samples.
//!
//! Samples are keyed by epoch second. Each one is converted to a calendar
//! date in the chosen time zone and summed into that day's total; year
//! totals and the min/max day total are derived once from the day totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use tracing::{debug, warn};

use crate::error::HeatmapError;

/// A single reading-time sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Epoch timestamp in seconds.
    pub timestamp: i64,
    /// Reading duration in seconds.
    pub seconds: u64,
}

impl From<(i64, u64)> for Sample {
    fn from((timestamp, seconds): (i64, u64)) -> Self {
        Self { timestamp, seconds }
    }
}

/// Accumulated duration per calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayTotals(BTreeMap<NaiveDate, u64>);

impl DayTotals {
    /// Returns the total for a date, or `None` if nothing was recorded.
    pub fn get(&self, date: NaiveDate) -> Option<u64> {
        self.0.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates days in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.0.iter().map(|(date, total)| (*date, *total))
    }

    /// Sums day totals by calendar year.
    pub fn year_totals(&self) -> YearTotals {
        let mut years: BTreeMap<i32, u64> = BTreeMap::new();
        for (date, total) in self.iter() {
            let year = years.entry(date.year()).or_insert(0);
            *year = year.saturating_add(total);
        }
        YearTotals(years)
    }

    /// Min and max over all day totals; `None` when there are no days.
    pub fn value_range(&self) -> Option<ValueRange> {
        let lower = self.0.values().copied().min()?;
        let upper = self.0.values().copied().max()?;
        Some(ValueRange { lower, upper })
    }

    fn add(&mut self, date: NaiveDate, seconds: u64) {
        let day = self.0.entry(date).or_insert(0);
        *day = day.saturating_add(seconds);
    }
}

impl FromIterator<(NaiveDate, u64)> for DayTotals {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u64)>>(iter: I) -> Self {
        let mut days = Self::default();
        for (date, seconds) in iter {
            days.add(date, seconds);
        }
        days
    }
}

/// Accumulated duration per calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearTotals(BTreeMap<i32, u64>);

impl YearTotals {
    /// Returns the year's total, zero for years without samples.
    pub fn get(&self, year: i32) -> u64 {
        self.0.get(&year).copied().unwrap_or(0)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.keys().copied()
    }
}

/// Observed `[lower, upper]` of day totals, used to normalize color intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub lower: u64,
    pub upper: u64,
}

impl ValueRange {
    pub fn diameter(&self) -> u64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: u64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Position of `value` within the range in `[0, 1]`, or `None` for a
    /// degenerate range.
    pub fn ratio(&self, value: u64) -> Option<f64> {
        let diameter = self.diameter();
        if diameter == 0 {
            return None;
        }
        let offset = value.saturating_sub(self.lower).min(diameter);
        Some(offset as f64 / diameter as f64)
    }
}

/// Everything the layout engine needs from the raw samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub days: DayTotals,
    pub years: YearTotals,
    /// `None` when no day has any samples.
    pub range: Option<ValueRange>,
}

impl Aggregation {
    /// Builds the derived totals from day totals.
    pub fn from_days(days: DayTotals) -> Self {
        let years = days.year_totals();
        let range = days.value_range();
        Self { days, years, range }
    }

    /// Returns the value range, failing when the data is empty.
    pub fn require_range(&self) -> Result<ValueRange, HeatmapError> {
        self.range.ok_or(HeatmapError::EmptyInput)
    }
}

/// Aggregates samples by calendar date in the local time zone.
pub fn aggregate<I>(samples: I) -> Aggregation
where
    I: IntoIterator,
    I::Item: Into<Sample>,
{
    aggregate_in(samples, &Local)
}

/// Aggregates samples by calendar date in `tz`.
///
/// Samples landing on the same date are summed. Timestamps outside the
/// representable date range are skipped.
pub fn aggregate_in<I, Tz>(samples: I, tz: &Tz) -> Aggregation
where
    I: IntoIterator,
    I::Item: Into<Sample>,
    Tz: TimeZone,
{
    let mut days = DayTotals::default();
    let mut count = 0usize;

    for sample in samples {
        let sample = sample.into();
        let Some(utc) = DateTime::from_timestamp(sample.timestamp, 0) else {
            warn!(timestamp = sample.timestamp, "skipping out-of-range timestamp");
            continue;
        };
        days.add(utc.with_timezone(tz).date_naive(), sample.seconds);
        count += 1;
    }

    let aggregation = Aggregation::from_days(days);

    debug!(
        samples = count,
        days = aggregation.days.len(),
        range = ?aggregation.range,
        "aggregated read times",
    );

    aggregation
}
