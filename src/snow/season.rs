//! Snow-year summaries of hourly weather records.
//!
//! A snow year runs from 1 July to the following 1 July (UTC) and is named
//! after the year it starts in, so season 2021 is labelled `2021–22`.

use super::sectors::{compute_sector_transport, SECTOR_COUNT};
use super::transport::{snow_transport, SnowDriftParams, SnowTransportResult, WindSample};
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// One hourly weather observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub timestamp: DateTime<Utc>,
    /// Air temperature at 2 m, °C.
    pub temperature: f64,
    /// Precipitation over the hour, mm.
    pub precipitation: f64,
    /// Wind speed at 10 m, m/s.
    pub wind_speed: f64,
    /// Wind direction at 10 m, degrees.
    pub wind_direction: f64,
}

impl WeatherRecord {
    /// Precipitation that fell as snow, or 0.
    pub fn swe(&self, freezing_threshold: f64) -> f64 {
        if self.temperature < freezing_threshold && self.precipitation.is_finite() {
            self.precipitation
        } else {
            0.0
        }
    }

    pub fn wind(&self) -> WindSample {
        WindSample::new(self.wind_speed, self.wind_direction)
    }
}

/// Snow transport of one snow year.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonTransport {
    /// Starting year of the season.
    pub season: i32,
    pub label: String,
    pub qt_tonnes: f64,
    pub result: SnowTransportResult,
}

/// Snow transport of one calendar month inside a snow year.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTransport {
    pub season: i32,
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM`.
    pub label: String,
    pub qt_tonnes: f64,
}

/// Total snow water equivalent (mm) of the records.
///
/// Non-finite precipitation counts as none.
pub fn swe_total(records: &[WeatherRecord], freezing_threshold: f64) -> f64 {
    records.iter().map(|r| r.swe(freezing_threshold)).sum()
}

/// `2021` -> `2021–22`.
pub fn season_label(season: i32) -> String {
    format!("{}–{:02}", season, (season + 1).rem_euclid(100))
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AnalysisError::TimestampError(format!("invalid month {}-{:02}", year, month)))
}

/// Half-open `[start, end)` window of a snow year.
pub fn snow_year_window(season: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    Ok((month_start(season, 7)?, month_start(season + 1, 7)?))
}

fn within(records: &[WeatherRecord], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<WeatherRecord> {
    records
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp < end)
        .copied()
        .collect()
}

fn transport_of(records: &[WeatherRecord], params: &SnowDriftParams) -> Result<SnowTransportResult> {
    let swe = swe_total(records, params.freezing_threshold);
    let wind: Vec<WindSample> = records.iter().map(WeatherRecord::wind).collect();
    snow_transport(params, swe, &wind)
}

fn check_range(seasons: &RangeInclusive<i32>) -> Result<()> {
    if seasons.end() < seasons.start() {
        return Err(AnalysisError::invalid(format!(
            "last season ({}) precedes first season ({})",
            seasons.end(),
            seasons.start()
        )));
    }
    Ok(())
}

/// Transport of every snow year in `seasons`. Seasons without records are
/// skipped.
pub fn seasonal_transport(
    records: &[WeatherRecord],
    params: &SnowDriftParams,
    seasons: RangeInclusive<i32>,
) -> Result<Vec<SeasonTransport>> {
    check_range(&seasons)?;
    params.validate()?;

    let mut out = Vec::new();
    for season in seasons {
        let (start, end) = snow_year_window(season)?;
        let slice = within(records, start, end);
        if slice.is_empty() {
            debug!(season, "no records in snow year, skipping");
            continue;
        }
        let result = transport_of(&slice, params)?;
        out.push(SeasonTransport {
            season,
            label: season_label(season),
            qt_tonnes: result.qt_tonnes(),
            result,
        });
    }
    Ok(out)
}

/// Transport of each calendar month of a snow year, July to June. Months
/// without records are skipped.
pub fn monthly_transport(
    records: &[WeatherRecord],
    params: &SnowDriftParams,
    season: i32,
) -> Result<Vec<MonthlyTransport>> {
    params.validate()?;

    let mut out = Vec::new();
    let mut start = month_start(season, 7)?;
    for _ in 0..12 {
        let (next_year, next_month) = if start.month() == 12 {
            (start.year() + 1, 1)
        } else {
            (start.year(), start.month() + 1)
        };
        let end = month_start(next_year, next_month)?;

        let slice = within(records, start, end);
        if !slice.is_empty() {
            let result = transport_of(&slice, params)?;
            out.push(MonthlyTransport {
                season,
                year: start.year(),
                month: start.month(),
                label: start.format("%Y-%m").to_string(),
                qt_tonnes: result.qt_tonnes(),
            });
        }
        start = end;
    }
    Ok(out)
}

/// Per-sector potential transport averaged over the snow years that have
/// records.
pub fn average_sector_transport(
    records: &[WeatherRecord],
    seasons: RangeInclusive<i32>,
) -> Result<[f64; SECTOR_COUNT]> {
    check_range(&seasons)?;

    let mut totals = [0.0; SECTOR_COUNT];
    let mut used = 0usize;
    for season in seasons {
        let (start, end) = snow_year_window(season)?;
        let slice = within(records, start, end);
        if slice.is_empty() {
            continue;
        }
        let wind: Vec<WindSample> = slice.iter().map(WeatherRecord::wind).collect();
        for (total, sector) in totals.iter_mut().zip(compute_sector_transport(&wind)?) {
            *total += sector;
        }
        used += 1;
    }

    if used == 0 {
        return Err(AnalysisError::EmptyData);
    }
    for total in totals.iter_mut() {
        *total /= used as f64;
    }
    Ok(totals)
}
