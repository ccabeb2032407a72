//! Short-time Fourier transform and spectrogram.
//!
//! Segments are tapered with a periodic Hann window, the signal is
//! zero-padded by half a segment on both sides and at the end up to a whole
//! number of hops, and each one-sided FFT is scaled by `1 / sum(window)`.
//! The sample rate is fixed at one sample per hour.

use crate::core::HourlySeries;
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;
use std::f64::consts::PI;
use tracing::debug;

/// Magnitude of a short-time Fourier transform.
#[derive(Debug, Clone, Serialize)]
pub struct StftMagnitude {
    /// Bin frequencies in cycles per sample, `k / segment_len`.
    pub frequencies: Vec<f64>,
    /// Segment centre offsets in samples from the first input sample.
    pub offsets: Vec<usize>,
    /// `magnitude[segment][bin]`.
    pub magnitude: Vec<Vec<f64>>,
}

/// Time-frequency magnitude map with calendar time on the time axis.
#[derive(Debug, Clone, Serialize)]
pub struct SpectrogramGrid {
    /// Bin frequencies in cycles per hour.
    pub frequencies: Vec<f64>,
    /// Timestamp of each time bucket.
    pub times: Vec<DateTime<Utc>>,
    /// `magnitude[time_bucket][frequency_bin]`.
    pub magnitude: Vec<Vec<f64>>,
}

impl SpectrogramGrid {
    /// `(time buckets, frequency bins)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.times.len(), self.frequencies.len())
    }

    /// Bin with the largest magnitude summed over all time buckets.
    pub fn peak_frequency_bin(&self) -> Option<usize> {
        let bins = self.frequencies.len();
        if bins == 0 || self.magnitude.is_empty() {
            return None;
        }
        let mut totals = vec![0.0; bins];
        for row in &self.magnitude {
            for (total, m) in totals.iter_mut().zip(row.iter()) {
                *total += m;
            }
        }
        totals
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Frequency of [`peak_frequency_bin`](Self::peak_frequency_bin).
    pub fn peak_frequency(&self) -> Option<f64> {
        self.peak_frequency_bin().map(|i| self.frequencies[i])
    }

    /// Largest magnitude anywhere in the grid.
    pub fn max_magnitude(&self) -> f64 {
        self.magnitude
            .iter()
            .flat_map(|row| row.iter())
            .fold(0.0, |acc, &m| acc.max(m))
    }
}

/// Periodic Hann window of length `n`.
fn hann_periodic(n: usize) -> Vec<f64> {
    // A single-sample Hann window is all ones, not a lone zero.
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

fn validate(n: usize, segment_len: usize, overlap_len: usize) -> Result<()> {
    if segment_len == 0 {
        return Err(AnalysisError::invalid("segment_len must be positive"));
    }
    if overlap_len >= segment_len {
        return Err(AnalysisError::invalid(format!(
            "overlap_len ({}) must be smaller than segment_len ({})",
            overlap_len, segment_len
        )));
    }
    if n == 0 {
        return Err(AnalysisError::EmptyData);
    }
    if segment_len > n {
        return Err(AnalysisError::invalid(format!(
            "segment_len ({}) exceeds the number of samples ({})",
            segment_len, n
        )));
    }
    Ok(())
}

/// Magnitude STFT of a uniformly sampled signal.
pub fn stft_magnitude(signal: &[f64], segment_len: usize, overlap_len: usize) -> Result<StftMagnitude> {
    validate(signal.len(), segment_len, overlap_len)?;
    if signal.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::invalid(
            "signal contains non-finite values; fill or drop them first",
        ));
    }

    let hop = segment_len - overlap_len;
    let half = segment_len / 2;

    // Zero boundary extension, then pad the tail to a whole number of hops.
    let mut padded = vec![0.0; half];
    padded.extend_from_slice(signal);
    padded.extend(std::iter::repeat(0.0).take(half));
    let remainder = (padded.len() - segment_len) % hop;
    let tail = if remainder == 0 { 0 } else { (hop - remainder) % segment_len };
    padded.extend(std::iter::repeat(0.0).take(tail));

    let segments = (padded.len() - segment_len) / hop + 1;
    let bins = segment_len / 2 + 1;

    let window = hann_periodic(segment_len);
    let scale = 1.0 / window.iter().sum::<f64>();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(segment_len);

    let mut magnitude = Vec::with_capacity(segments);
    let mut offsets = Vec::with_capacity(segments);
    let mut buffer = vec![Complex64::new(0.0, 0.0); segment_len];

    for s in 0..segments {
        let start = s * hop;
        for (slot, (&x, &w)) in buffer
            .iter_mut()
            .zip(padded[start..start + segment_len].iter().zip(window.iter()))
        {
            *slot = Complex64::new(x * w, 0.0);
        }
        fft.process(&mut buffer);
        magnitude.push(buffer.iter().take(bins).map(|z| z.norm() * scale).collect());
        offsets.push(start);
    }

    let frequencies = (0..bins).map(|k| k as f64 / segment_len as f64).collect();

    Ok(StftMagnitude {
        frequencies,
        offsets,
        magnitude,
    })
}

/// Spectrogram of an hourly series.
///
/// Time bucket `j` is stamped `start + j * (segment_len - overlap_len)` hours.
pub fn spectrogram(series: &HourlySeries, segment_len: usize, overlap_len: usize) -> Result<SpectrogramGrid> {
    debug!(n = series.len(), segment_len, overlap_len, "spectrogram");
    let stft = stft_magnitude(series.values(), segment_len, overlap_len)?;
    let start = series.start().ok_or(AnalysisError::EmptyData)?;

    let times = stft
        .offsets
        .iter()
        .map(|&offset| start + Duration::hours(offset as i64))
        .collect();

    Ok(SpectrogramGrid {
        frequencies: stft.frequencies,
        times,
        magnitude: stft.magnitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn sine(n: usize, period: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * i as f64 / period).sin())
            .collect()
    }

    #[test]
    fn grid_shape_follows_padding_rules() {
        // 100 samples, nperseg 40, noverlap 20: 20 + 100 + 20 = 140 padded,
        // (140 - 40) % 20 == 0, so (140 - 40) / 20 + 1 = 6 segments.
        let series = HourlySeries::hourly(start(), sine(100, 24.0));
        let grid = spectrogram(&series, 40, 20).unwrap();
        assert_eq!(grid.shape(), (6, 21));
        assert_relative_eq!(grid.frequencies[1], 1.0 / 40.0, epsilon = 1e-15);
        assert_relative_eq!(grid.frequencies[20], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn tail_is_padded_to_whole_hops() {
        // 101 + 40 = 141 padded; remainder 1 -> 19 extra zeros -> 160.
        let stft = stft_magnitude(&sine(101, 24.0), 40, 20).unwrap();
        assert_eq!(stft.offsets.len(), 7);
        assert_eq!(stft.offsets[6], 120);
    }

    #[test]
    fn bucket_times_advance_by_hop() {
        let series = HourlySeries::hourly(start(), sine(200, 24.0));
        let grid = spectrogram(&series, 48, 36).unwrap();
        assert_eq!(grid.times[0], start());
        assert_eq!(grid.times[1], start() + Duration::hours(12));
        assert_eq!(grid.times[3] - grid.times[2], Duration::hours(12));
    }

    #[test]
    fn daily_cycle_peaks_at_its_bin() {
        let series = HourlySeries::hourly(start(), sine(24 * 60, 24.0));
        let grid = spectrogram(&series, 48, 24).unwrap();
        assert_eq!(grid.peak_frequency_bin(), Some(2));
        assert_relative_eq!(grid.peak_frequency().unwrap(), 1.0 / 24.0, epsilon = 1e-15);
    }

    #[test]
    fn magnitude_of_constant_signal() {
        // Hann-weighted DC: a full interior segment of ones gives exactly 1.
        let stft = stft_magnitude(&vec![1.0; 64], 16, 8).unwrap();
        let interior = &stft.magnitude[2];
        assert_relative_eq!(interior[0], 1.0, epsilon = 1e-12);
        assert!(interior[3] < 1e-12);
    }

    #[test]
    fn single_sample_segments_are_finite() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let stft = stft_magnitude(&values, 1, 0).unwrap();
        assert_eq!(stft.magnitude.len(), 10);
        assert!(stft.magnitude.iter().flatten().all(|m| m.is_finite()));
        // Each bucket holds one unit-weighted sample: |x|.
        for (row, x) in stft.magnitude.iter().zip(&values) {
            assert_eq!(row.len(), 1);
            assert_relative_eq!(row[0], x.abs(), epsilon = 1e-12);
        }
        assert_eq!(hann_periodic(1), vec![1.0]);
    }

    #[test]
    fn rejects_invalid_windows() {
        let series = HourlySeries::hourly(start(), sine(50, 24.0));
        assert!(matches!(
            spectrogram(&series, 40, 40),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            spectrogram(&series, 60, 20),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            spectrogram(&series, 0, 0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        let empty = HourlySeries::hourly(start(), Vec::new());
        assert_eq!(spectrogram(&empty, 4, 2).unwrap_err(), AnalysisError::EmptyData);
    }

    #[test]
    fn rejects_missing_values() {
        let mut values = sine(50, 24.0);
        values[3] = f64::NAN;
        assert!(stft_magnitude(&values, 10, 5).is_err());
    }

    #[test]
    fn max_magnitude_is_positive_for_nonzero_signal() {
        let series = HourlySeries::hourly(start(), sine(240, 12.0));
        let grid = spectrogram(&series, 24, 12).unwrap();
        assert!(grid.max_magnitude() > 0.3);
    }
}
