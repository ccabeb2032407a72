//! Statistical-process-control outliers around a DCT low-pass trend.
//!
//! The signal is split in the cosine domain at a cutoff frequency: the
//! low band reconstructs the trend, the high band (`satv`) gives a robust
//! spread estimate. Samples further than `k` spreads from the trend are
//! flagged.

use crate::core::{fill_non_finite, OutlierReport};
use crate::error::{AnalysisError, Result};
use crate::spectral::{dct_ortho, idct_ortho};
use crate::utils::{finite_mean, median_abs_deviation, trimmed_mean, MAD_NORMAL_SCALE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parameters of the frequency-domain outlier detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpcConfig {
    /// Normalized cutoff frequency in cycles per sample, in `(0, 0.5]`.
    pub cutoff: f64,
    /// Sigma multiplier for the boundaries.
    pub k: f64,
}

impl Default for SpcConfig {
    fn default() -> Self {
        Self {
            cutoff: 1.0 / 240.0, // ten days of hourly samples
            k: 3.0,
        }
    }
}

impl SpcConfig {
    pub fn new(cutoff: f64, k: f64) -> Self {
        Self { cutoff, k }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 || self.cutoff > 0.5 {
            return Err(AnalysisError::invalid(format!(
                "cutoff must be in (0, 0.5], got {}",
                self.cutoff
            )));
        }
        if !self.k.is_finite() || self.k <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "k must be positive, got {}",
                self.k
            )));
        }
        Ok(())
    }
}

/// Outcome of [`detect_frequency_outliers`].
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyOutlierResult {
    pub report: OutlierReport,
    /// Low-pass reconstruction used as the expected value.
    pub trend: Vec<f64>,
    pub upper_boundary: Vec<f64>,
    pub lower_boundary: Vec<f64>,
    /// `1.4826 * MAD` of the high-pass signal.
    pub spread: f64,
    pub cutoff: f64,
    pub k: f64,
}

/// Frequency (cycles/sample) of each DCT coefficient: `N` points spaced
/// evenly from 0 to the Nyquist frequency 0.5.
fn coefficient_frequencies(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.0];
    }
    (0..n).map(|i| 0.5 * i as f64 / (n - 1) as f64).collect()
}

/// Replace non-finite samples with the mean of the finite ones.
fn prepare_signal(series: &[f64]) -> Result<Vec<f64>> {
    if series.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    if series.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    let missing = series.iter().filter(|v| !v.is_finite()).count();
    if missing == 0 {
        return Ok(series.to_vec());
    }
    let fill = finite_mean(series);
    if fill.is_nan() {
        return Err(AnalysisError::InsufficientData {
            needed: 1,
            got: 0,
        });
    }
    warn!(missing, fill, "replacing non-finite samples with the series mean");
    Ok(fill_non_finite(series, fill))
}

/// `1.4826 * MAD` of the high-pass signal.
///
/// Spreads at rounding-noise level relative to the signal's own magnitude
/// count as zero; an all-zero signal has zero spread.
fn robust_spread(satv: &[f64], signal: &[f64]) -> Result<f64> {
    let spread = median_abs_deviation(satv) * MAD_NORMAL_SCALE;
    let magnitude = signal.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if spread.is_nan() || spread <= 1e-12 * magnitude {
        return Err(AnalysisError::NumericDegeneracy(
            "high-pass signal has zero median absolute deviation".to_string(),
        ));
    }
    Ok(spread)
}

fn flag(signal: &[f64], upper: &[f64], lower: &[f64]) -> Vec<bool> {
    signal
        .iter()
        .zip(upper.iter().zip(lower.iter()))
        .map(|(x, (u, l))| x > u || x < l)
        .collect()
}

/// Flag samples that leave the band `trend ± k * spread`.
pub fn detect_frequency_outliers(series: &[f64], cutoff: f64, k: f64) -> Result<FrequencyOutlierResult> {
    let config = SpcConfig::new(cutoff, k);
    config.validate()?;
    let signal = prepare_signal(series)?;
    let n = signal.len();
    debug!(n, cutoff, k, "frequency outlier detection");

    let coefficients = dct_ortho(&signal);
    let frequencies = coefficient_frequencies(n);

    let high_pass: Vec<f64> = coefficients
        .iter()
        .zip(frequencies.iter())
        .map(|(&c, &w)| if w < cutoff { 0.0 } else { c })
        .collect();
    let satv = idct_ortho(&high_pass);

    let low_pass: Vec<f64> = coefficients
        .iter()
        .zip(frequencies.iter())
        .map(|(&c, &w)| if w > cutoff { 0.0 } else { c })
        .collect();
    let trend = idct_ortho(&low_pass);

    let spread = robust_spread(&satv, &signal)?;

    let upper_boundary: Vec<f64> = trend.iter().map(|t| t + k * spread).collect();
    let lower_boundary: Vec<f64> = trend.iter().map(|t| t - k * spread).collect();
    let report = OutlierReport::from_mask(flag(&signal, &upper_boundary, &lower_boundary));

    debug!(spread, num_outliers = report.num_outliers, "frequency outlier detection finished");

    Ok(FrequencyOutlierResult {
        report,
        trend,
        upper_boundary,
        lower_boundary,
        spread,
        cutoff,
        k,
    })
}

/// Older variant with a flat trimmed-mean baseline.
///
/// The spread still comes from the DCT high-pass signal, but the band is
/// centred on the `proportion`-trimmed mean of the raw signal instead of
/// the low-pass trend, so slow level changes show up as outliers.
#[deprecated(note = "use detect_frequency_outliers, which centres the band on the low-pass trend")]
pub fn detect_trimmed_mean_outliers(
    series: &[f64],
    cutoff: f64,
    k: f64,
    proportion: f64,
) -> Result<FrequencyOutlierResult> {
    SpcConfig::new(cutoff, k).validate()?;
    if !(0.0..0.5).contains(&proportion) {
        return Err(AnalysisError::invalid(format!(
            "trim proportion must be in [0, 0.5), got {}",
            proportion
        )));
    }
    let signal = prepare_signal(series)?;
    let n = signal.len();

    let coefficients = dct_ortho(&signal);
    let high_pass: Vec<f64> = coefficients
        .iter()
        .zip(coefficient_frequencies(n))
        .map(|(&c, w)| if w < cutoff { 0.0 } else { c })
        .collect();
    let satv = idct_ortho(&high_pass);

    let spread = robust_spread(&satv, &signal)?;

    let baseline = trimmed_mean(&signal, proportion);
    let trend = vec![baseline; n];
    let upper_boundary = vec![baseline + k * spread; n];
    let lower_boundary = vec![baseline - k * spread; n];
    let report = OutlierReport::from_mask(flag(&signal, &upper_boundary, &lower_boundary));

    Ok(FrequencyOutlierResult {
        report,
        trend,
        upper_boundary,
        lower_boundary,
        spread,
        cutoff,
        k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn daily_cycle(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 10.0 + 5.0 * (2.0 * PI * t as f64 / 24.0).sin())
            .collect()
    }

    #[test]
    fn flags_injected_spikes() {
        let mut series = daily_cycle(24 * 60);
        for &i in &[100, 500, 900] {
            series[i] += 50.0;
        }

        let result = detect_frequency_outliers(&series, 1.0 / 240.0, 3.0).unwrap();

        assert_eq!(result.report.outlier_indices(), vec![100, 500, 900]);
        assert_eq!(result.report.num_sample, 1440);
        assert_eq!(result.report.ratio_outlier, 0.21);
        assert_eq!(result.trend.len(), 1440);
    }

    #[test]
    fn trend_follows_slow_component() {
        let series = daily_cycle(24 * 60);
        let result = detect_frequency_outliers(&series, 1.0 / 240.0, 3.0).unwrap();
        // The daily cycle sits far above the cutoff, so the trend is the mean level.
        for t in &result.trend[120..1320] {
            assert!((t - 10.0).abs() < 0.5, "trend {}", t);
        }
    }

    #[test]
    fn boundaries_are_symmetric_around_trend() {
        let series = daily_cycle(480);
        let result = detect_frequency_outliers(&series, 0.01, 2.5).unwrap();
        for i in 0..series.len() {
            assert_relative_eq!(
                result.upper_boundary[i] - result.trend[i],
                2.5 * result.spread,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                result.trend[i] - result.lower_boundary[i],
                2.5 * result.spread,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn larger_k_never_flags_more() {
        let mut series = daily_cycle(720);
        series[10] += 12.0;
        series[200] -= 20.0;
        series[600] += 35.0;

        let mut previous = usize::MAX;
        for k in [1.0, 1.5, 2.0, 3.0, 4.0, 5.0] {
            let count = detect_frequency_outliers(&series, 1.0 / 240.0, k)
                .unwrap()
                .report
                .num_outliers;
            assert!(count <= previous, "k={} flagged {} > {}", k, count, previous);
            previous = count;
        }
    }

    #[test]
    fn missing_values_are_imputed() {
        let mut series = daily_cycle(480);
        series[7] = f64::NAN;
        series[300] = f64::NAN;
        let result = detect_frequency_outliers(&series, 1.0 / 240.0, 3.0).unwrap();
        assert_eq!(result.report.num_sample, 480);
        assert!(!result.report.is_outlier(7));
    }

    #[test]
    fn tiny_scale_signal_is_not_degenerate() {
        let mut series: Vec<f64> = daily_cycle(24 * 60).iter().map(|x| x * 1e-13).collect();
        for &i in &[100, 500, 900] {
            series[i] += 50.0e-13;
        }

        let result = detect_frequency_outliers(&series, 1.0 / 240.0, 3.0).unwrap();
        assert_eq!(result.report.outlier_indices(), vec![100, 500, 900]);
        assert!(result.spread > 0.0);
    }

    #[test]
    fn all_zero_series_is_degenerate() {
        let err = detect_frequency_outliers(&[0.0; 100], 1.0 / 240.0, 3.0).unwrap_err();
        assert!(matches!(err, AnalysisError::NumericDegeneracy(_)));
    }

    #[test]
    fn constant_series_is_degenerate() {
        let err = detect_frequency_outliers(&[4.2; 100], 1.0 / 240.0, 3.0).unwrap_err();
        assert!(matches!(err, AnalysisError::NumericDegeneracy(_)));
    }

    #[test]
    fn rejects_bad_parameters() {
        let series = daily_cycle(100);
        for (cutoff, k) in [(0.0, 3.0), (0.6, 3.0), (f64::NAN, 3.0), (0.1, 0.0), (0.1, -1.0)] {
            assert!(matches!(
                detect_frequency_outliers(&series, cutoff, k),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
        assert!(detect_frequency_outliers(&series, 0.5, 3.0).is_ok());
    }

    #[test]
    fn rejects_empty_and_all_missing() {
        assert_eq!(
            detect_frequency_outliers(&[], 0.1, 3.0).unwrap_err(),
            AnalysisError::EmptyData
        );
        assert!(matches!(
            detect_frequency_outliers(&[f64::NAN; 10], 0.1, 3.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            detect_frequency_outliers(&[1.0], 0.1, 3.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn default_config() {
        let config = SpcConfig::default();
        assert_relative_eq!(config.cutoff, 1.0 / 240.0, epsilon = 1e-15);
        assert_relative_eq!(config.k, 3.0, epsilon = 1e-15);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[allow(deprecated)]
    fn trimmed_mean_baseline_is_flat() {
        // A slow ramp: the trend-based detector follows it, the flat
        // baseline flags both ends.
        let series: Vec<f64> = (0..960)
            .map(|t| 0.05 * t as f64 + (2.0 * PI * t as f64 / 24.0).sin())
            .collect();

        let flat = detect_trimmed_mean_outliers(&series, 1.0 / 240.0, 3.0, 0.1).unwrap();
        let first = flat.trend[0];
        assert!(flat.trend.iter().all(|&t| t == first));
        assert!(flat.report.is_outlier(0));
        assert!(flat.report.is_outlier(959));

        let tracked = detect_frequency_outliers(&series, 1.0 / 240.0, 3.0).unwrap();
        assert!(tracked.report.num_outliers < flat.report.num_outliers);

        assert!(detect_trimmed_mean_outliers(&series, 1.0 / 240.0, 3.0, 0.5).is_err());
    }
}
