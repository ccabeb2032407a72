//! STL (Seasonal-Trend decomposition using LOESS) implementation.
//!
//! STL decomposes a time series into three components:
//! - Trend: The underlying long-term pattern
//! - Seasonal: The repeating seasonal pattern
//! - Residual: What is left after removing trend and seasonal
//!
//! The smoothers are local-linear LOESS fits with tricube weights, following
//! Cleveland et al. (1990). Window lengths are validated, never coerced: an
//! even seasonal or trend window is rejected with
//! [`AnalysisError::InvalidParameter`].

use crate::error::{AnalysisError, Result};
use crate::utils::stats::variance;
use crate::utils::{median, moving_average};
use serde::Serialize;
use tracing::{debug, trace};

/// Relative change in trend and seasonal below which robustness passes stop.
const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Result of STL decomposition.
#[derive(Debug, Clone, Serialize)]
pub struct DecompositionResult {
    /// Input series.
    pub observed: Vec<f64>,
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Residual component, `observed - trend - seasonal`.
    pub residual: Vec<f64>,
    /// Final robustness weights (all 1.0 in non-robust mode).
    pub weights: Vec<f64>,
    /// Number of outer passes actually run.
    pub outer_passes: usize,
}

impl DecompositionResult {
    /// Get the seasonal strength (0 to 1).
    /// Values close to 1 indicate strong seasonality.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.residual)
    }

    /// Get the trend strength (0 to 1).
    /// Values close to 1 indicate strong trend.
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.residual)
    }

    /// Seasonally adjusted series, `observed - seasonal`.
    pub fn deseasonalized(&self) -> Vec<f64> {
        self.observed
            .iter()
            .zip(self.seasonal.iter())
            .map(|(y, s)| y - s)
            .collect()
    }
}

fn strength(component: &[f64], residual: &[f64]) -> f64 {
    let combined: Vec<f64> = component
        .iter()
        .zip(residual.iter())
        .map(|(c, r)| c + r)
        .collect();
    let var_combined = variance(&combined);
    if var_combined < 1e-10 {
        return 0.0;
    }
    (1.0 - variance(residual) / var_combined).max(0.0)
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct STL {
    /// Samples per seasonal cycle.
    period: usize,
    /// Seasonal LOESS span (ns), odd.
    seasonal_window: usize,
    /// Trend LOESS span (nt), odd.
    trend_window: usize,
    /// Low-pass LOESS span (nl), odd.
    low_pass_window: usize,
    /// Number of inner iterations.
    inner_iterations: usize,
    /// Maximum number of robustness re-weighting passes.
    outer_iterations: usize,
    /// Use robust fitting.
    robust: bool,
}

impl STL {
    /// Create a non-robust decomposer.
    ///
    /// The low-pass window defaults to the smallest odd integer greater
    /// than `period`.
    pub fn new(period: usize, seasonal_window: usize, trend_window: usize) -> Self {
        Self {
            period,
            seasonal_window,
            trend_window,
            low_pass_window: next_odd(period),
            inner_iterations: 5,
            outer_iterations: 0,
            robust: false,
        }
    }

    /// Enable robust fitting with default iterations (2 inner, 15 outer).
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self.inner_iterations = 2;
        self.outer_iterations = 15;
        self
    }

    /// Set maximum number of outer (robustness) iterations.
    pub fn with_outer_iterations(mut self, n: usize) -> Self {
        self.outer_iterations = n;
        if n > 0 {
            self.robust = true;
        }
        self
    }

    /// Set number of inner iterations.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n;
        self
    }

    /// Set the low-pass LOESS span.
    pub fn with_low_pass_window(mut self, nl: usize) -> Self {
        self.low_pass_window = nl;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn is_robust(&self) -> bool {
        self.robust
    }

    /// Check the window and iteration settings without any data.
    pub fn validate_parameters(&self) -> Result<()> {
        if self.period < 2 {
            return Err(AnalysisError::invalid(format!(
                "period must be at least 2, got {}",
                self.period
            )));
        }
        for (name, window) in [
            ("seasonal_window", self.seasonal_window),
            ("trend_window", self.trend_window),
            ("low_pass_window", self.low_pass_window),
        ] {
            if window < 3 || window % 2 == 0 {
                return Err(AnalysisError::invalid(format!(
                    "{} must be odd and at least 3, got {}",
                    name, window
                )));
            }
        }
        if self.inner_iterations == 0 {
            return Err(AnalysisError::invalid("inner_iterations must be positive"));
        }
        Ok(())
    }

    fn validate(&self, series: &[f64]) -> Result<()> {
        self.validate_parameters()?;
        if series.is_empty() {
            return Err(AnalysisError::EmptyData);
        }
        if series.len() < 2 * self.period {
            return Err(AnalysisError::InsufficientData {
                needed: 2 * self.period,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::invalid(
                "series contains non-finite values; fill or drop them first",
            ));
        }
        Ok(())
    }

    /// Decompose the series.
    pub fn decompose(&self, series: &[f64]) -> Result<DecompositionResult> {
        self.validate(series)?;
        let n = series.len();
        debug!(
            n,
            period = self.period,
            seasonal_window = self.seasonal_window,
            trend_window = self.trend_window,
            robust = self.robust,
            "stl decomposition"
        );

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        let max_passes = if self.robust {
            self.outer_iterations + 1
        } else {
            1
        };
        let mut passes = 0;

        for pass in 0..max_passes {
            let previous_trend = trend.clone();
            let previous_seasonal = seasonal.clone();

            for _ in 0..self.inner_iterations {
                self.inner_step(series, &weights, &mut seasonal, &mut trend);
            }
            passes += 1;

            if pass > 0
                && relative_change(&previous_trend, &trend) < CONVERGENCE_TOLERANCE
                && relative_change(&previous_seasonal, &seasonal) < CONVERGENCE_TOLERANCE
            {
                trace!(pass, "stl robustness passes converged");
                break;
            }

            if pass + 1 < max_passes {
                let residual: Vec<f64> = series
                    .iter()
                    .zip(seasonal.iter())
                    .zip(trend.iter())
                    .map(|((y, s), t)| y - s - t)
                    .collect();
                weights = robustness_weights(&residual);
            }
        }

        let residual: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();

        debug!(outer_passes = passes, "stl decomposition finished");

        Ok(DecompositionResult {
            observed: series.to_vec(),
            trend,
            seasonal,
            residual,
            weights,
            outer_passes: passes,
        })
    }

    /// One inner iteration: seasonal then trend update.
    fn inner_step(&self, series: &[f64], weights: &[f64], seasonal: &mut [f64], trend: &mut Vec<f64>) {
        let n = series.len();
        let period = self.period;

        // Step 1: Detrending
        let detrended: Vec<f64> = series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();

        // Step 2: Cycle-subseries smoothing, extended one cycle on each side
        let cycle = self.smooth_cycle_subseries(&detrended, weights);

        // Step 3: Low-pass filter of the smoothed cycle-subseries
        let low_pass = self.low_pass_filter(&cycle);

        // Step 4: Detrending of smoothed cycle-subseries
        for i in 0..n {
            seasonal[i] = cycle[i + period] - low_pass[i];
        }

        // Step 5: Deseasonalizing
        let deseasonalized: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .map(|(y, s)| y - s)
            .collect();

        // Step 6: Trend smoothing
        *trend = loess_smooth(&deseasonalized, weights, self.trend_window);
    }

    /// Smooth each cycle-subseries and extrapolate one point on either end.
    ///
    /// Output has `n + 2 * period` entries; entry `m` belongs to time
    /// `m - period`.
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let period = self.period;
        let mut result = vec![0.0; n + 2 * period];

        for cycle_pos in 0..period {
            let values: Vec<f64> = detrended.iter().skip(cycle_pos).step_by(period).copied().collect();
            let sub_weights: Vec<f64> = weights.iter().skip(cycle_pos).step_by(period).copied().collect();
            let k = values.len();

            for i in 0..k + 2 {
                let x = i as f64 - 1.0;
                let fitted = loess_fit(&values, &sub_weights, self.seasonal_window, x)
                    .unwrap_or_else(|| values[i.saturating_sub(1).min(k - 1)]);
                result[cycle_pos + i * period] = fitted;
            }
        }

        result
    }

    /// Low-pass filter: MA(period), MA(period), MA(3), then LOESS.
    fn low_pass_filter(&self, cycle: &[f64]) -> Vec<f64> {
        let ma1 = moving_average(cycle, self.period);
        let ma2 = moving_average(&ma1, self.period);
        let ma3 = moving_average(&ma2, 3);
        let unit = vec![1.0; ma3.len()];
        loess_smooth(&ma3, &unit, self.low_pass_window)
    }
}

/// Decompose `series` with the given period and odd smoothing windows.
pub fn decompose(
    series: &[f64],
    period: usize,
    seasonal_window: usize,
    trend_window: usize,
    robust: bool,
) -> Result<DecompositionResult> {
    let stl = STL::new(period, seasonal_window, trend_window);
    let stl = if robust { stl.robust() } else { stl };
    stl.decompose(series)
}

/// Local-linear LOESS fit of `values` (at positions 0..n) evaluated at `x`.
///
/// Returns `None` when every weight in the neighbourhood is zero.
fn loess_fit(values: &[f64], robustness: &[f64], span: usize, x: f64) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let (left, right) = if span >= n {
        (0, n - 1)
    } else {
        let half = (span / 2) as isize;
        let left = (x.round() as isize - half).clamp(0, (n - span) as isize) as usize;
        (left, left + span - 1)
    };

    let mut h = (x - left as f64).max(right as f64 - x);
    if span > n {
        h += ((span - n) / 2) as f64;
    }

    let upper = 0.999 * h;
    let lower = 0.001 * h;
    let mut w = vec![0.0; right - left + 1];
    let mut total = 0.0;
    for j in left..=right {
        let r = (j as f64 - x).abs();
        let tricube = if r <= lower {
            1.0
        } else if r <= upper {
            (1.0 - (r / h).powi(3)).powi(3)
        } else {
            0.0
        };
        let wj = tricube * robustness[j];
        w[j - left] = wj;
        total += wj;
    }

    if total <= 0.0 {
        return None;
    }
    for wj in w.iter_mut() {
        *wj /= total;
    }

    // Degree-1 correction
    if h > 0.0 {
        let a: f64 = w.iter().enumerate().map(|(o, wj)| wj * (left + o) as f64).sum();
        let b: f64 = w
            .iter()
            .enumerate()
            .map(|(o, wj)| wj * ((left + o) as f64 - a).powi(2))
            .sum();
        let range = (n - 1) as f64;
        if b.sqrt() > 0.001 * range {
            let slope = (x - a) / b;
            for (o, wj) in w.iter_mut().enumerate() {
                *wj *= slope * ((left + o) as f64 - a) + 1.0;
            }
        }
    }

    Some(
        w.iter()
            .enumerate()
            .map(|(o, wj)| wj * values[left + o])
            .sum(),
    )
}

/// LOESS smoothing evaluated at every position of the input.
fn loess_smooth(values: &[f64], robustness: &[f64], span: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| loess_fit(values, robustness, span, i as f64).unwrap_or(values[i]))
        .collect()
}

/// Bisquare robustness weights from the residual.
fn robustness_weights(residual: &[f64]) -> Vec<f64> {
    let abs_residual: Vec<f64> = residual.iter().map(|r| r.abs()).collect();
    let h = 6.0 * median(&abs_residual);

    residual
        .iter()
        .map(|r| {
            if h < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u <= 0.001 {
                1.0
            } else if u <= 0.999 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

fn relative_change(previous: &[f64], current: &[f64]) -> f64 {
    let max_diff = previous
        .iter()
        .zip(current.iter())
        .map(|(p, c)| (p - c).abs())
        .fold(0.0, f64::max);
    let (lo, hi) = current
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    if range <= 0.0 {
        max_diff
    } else {
        max_diff / range
    }
}

fn next_odd(period: usize) -> usize {
    if period % 2 == 0 {
        period + 1
    } else {
        period + 2
    }
}
