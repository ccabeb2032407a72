//! Time-indexed numeric series consumed by the analysis components.

use crate::error::{AnalysisError, Result};
use crate::utils::finite_mean;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// An ordered sequence of `(timestamp, value)` pairs.
///
/// Timestamps are strictly increasing. Uniform spacing is not enforced;
/// callers resample first if an algorithm needs it (see [`is_regular`]).
///
/// [`is_regular`]: HourlySeries::is_regular
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl HourlySeries {
    /// Create a series, validating alignment and timestamp ordering.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(AnalysisError::TimestampError(format!(
                    "timestamps must be strictly increasing (index {})",
                    i
                )));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Create an evenly spaced hourly series starting at `start`.
    pub fn hourly(start: DateTime<Utc>, values: Vec<f64>) -> Self {
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First timestamp, if any.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Extract `[start, end)` as a new series.
    pub fn slice(&self, start: usize, end: usize) -> Result<HourlySeries> {
        if start > end {
            return Err(AnalysisError::invalid("start must be <= end"));
        }
        if end > self.len() {
            return Err(AnalysisError::InsufficientData {
                needed: end,
                got: self.len(),
            });
        }
        Ok(HourlySeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Keep only observations with `from <= timestamp < until`.
    pub fn between(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> HourlySeries {
        let start = self.timestamps.partition_point(|t| *t < from);
        let end = self.timestamps.partition_point(|t| *t < until).max(start);
        HourlySeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Check if the series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Copy with every non-finite value replaced by the mean of the finite ones.
    pub fn filled_with_mean(&self) -> Result<HourlySeries> {
        let fill = finite_mean(&self.values);
        if fill.is_nan() {
            return Err(AnalysisError::InsufficientData {
                needed: 1,
                got: 0,
            });
        }
        Ok(HourlySeries {
            timestamps: self.timestamps.clone(),
            values: fill_non_finite(&self.values, fill),
        })
    }

    /// True when every consecutive pair of timestamps is exactly `step` apart.
    pub fn is_regular(&self, step: Duration) -> bool {
        self.timestamps.windows(2).all(|w| w[1] - w[0] == step)
    }
}

pub(crate) fn fill_non_finite(values: &[f64], fill: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v.is_finite() { v } else { fill })
        .collect()
}
