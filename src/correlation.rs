//! Lagged correlation between an energy series and a meteorological series.
//!
//! A positive `lag` pairs `energy[t]` with `meteo[t - lag]`, i.e. the weather
//! leads the energy series by `lag` hours.

use crate::error::{AnalysisError, Result};
use crate::utils::{centered_bounds, pearson};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

/// Global Pearson correlation at a fixed lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagCorrelation {
    pub lag: usize,
    /// Pearson coefficient in `[-1, 1]`.
    pub coefficient: f64,
    /// Two-sided p-value of the null hypothesis of zero correlation.
    pub p_value: f64,
    /// Number of overlapping pairs.
    pub pairs: usize,
}

fn check_lengths(energy: &[f64], meteo: &[f64]) -> Result<()> {
    if energy.len() != meteo.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: energy.len(),
            got: meteo.len(),
        });
    }
    Ok(())
}

fn p_value(r: f64, pairs: usize) -> Result<f64> {
    let df = (pairs - 2) as f64;
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalysisError::NumericDegeneracy(format!("t-distribution: {}", e)))?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Pearson correlation of `energy[lag..]` with `meteo[..n - lag]`.
pub fn lagged_correlation(energy: &[f64], meteo: &[f64], lag: usize) -> Result<LagCorrelation> {
    check_lengths(energy, meteo)?;
    let n = energy.len();
    if n == 0 {
        return Err(AnalysisError::EmptyData);
    }
    if lag + 2 >= n {
        return Err(AnalysisError::InsufficientData {
            needed: lag + 3,
            got: n,
        });
    }
    if energy.iter().chain(meteo.iter()).any(|v| !v.is_finite()) {
        return Err(AnalysisError::invalid(
            "series contain non-finite values; fill or drop them first",
        ));
    }

    let pairs = n - lag;
    let coefficient = pearson(&energy[lag..], &meteo[..pairs]);
    if coefficient.is_nan() {
        return Err(AnalysisError::NumericDegeneracy(
            "one of the series has zero variance over the overlap".to_string(),
        ));
    }
    let p_value = p_value(coefficient, pairs)?;

    debug!(lag, pairs, coefficient, p_value, "lagged correlation");

    Ok(LagCorrelation {
        lag,
        coefficient,
        p_value,
        pairs,
    })
}

/// Centred rolling correlation between `energy` and `meteo` shifted forward
/// by `lag`.
///
/// Entry `i` correlates the window of width `window` centred on `i`. It is
/// NaN when the window runs past either end, covers a sample with no lagged
/// partner, or has zero variance.
pub fn sliding_window_correlation(
    energy: &[f64],
    meteo: &[f64],
    lag: usize,
    window: usize,
) -> Result<Vec<f64>> {
    check_lengths(energy, meteo)?;
    if window < 2 {
        return Err(AnalysisError::invalid(format!(
            "window must be at least 2, got {}",
            window
        )));
    }
    let n = energy.len();
    debug!(n, lag, window, "sliding window correlation");

    let out = (0..n)
        .map(|i| match centered_bounds(i, n, window) {
            Some((start, end)) if start >= lag => {
                pearson(&energy[start..end], &meteo[start - lag..end - lag])
            }
            _ => f64::NAN,
        })
        .collect();
    Ok(out)
}
