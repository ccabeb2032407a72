//! End-to-end data-quality scenario on one year of hourly data.
//!
//! A daily cycle `10 + 5 sin(2πt/24)` with five +50 spikes runs through the
//! decomposition, both outlier detectors and the spectrogram, the way the
//! quality-check page chains them.

use chrono::{TimeZone, Utc};
use gridwatch_analysis::config::AnalysisConfig;
use gridwatch_analysis::core::HourlySeries;
use gridwatch_analysis::detection::{detect_density_outliers, detect_frequency_outliers};
use gridwatch_analysis::seasonality::{decompose, STL};
use gridwatch_analysis::spectral::spectrogram;
use gridwatch_analysis::utils::autocorrelation;
use std::f64::consts::PI;

const HOURS: usize = 8760;
const SPIKES: [usize; 5] = [500, 2000, 4003, 6011, 8000];

fn daily_cycle_with_spikes() -> Vec<f64> {
    let mut values: Vec<f64> = (0..HOURS)
        .map(|t| 10.0 + 5.0 * (2.0 * PI * t as f64 / 24.0).sin())
        .collect();
    for &i in &SPIKES {
        values[i] += 50.0;
    }
    values
}

fn hourly_series(values: Vec<f64>) -> HourlySeries {
    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    HourlySeries::hourly(start, values)
}

fn argmax_lag(values: &[f64], lags: std::ops::RangeInclusive<usize>) -> usize {
    lags.map(|lag| (lag, autocorrelation(values, lag)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(lag, _)| lag)
        .unwrap()
}

#[test]
fn seasonal_component_repeats_daily() {
    let values = daily_cycle_with_spikes();
    let result = STL::new(24, 25, 169).robust().decompose(&values).unwrap();

    assert_eq!(argmax_lag(&result.seasonal, 2..=36), 24);
    assert!(result.seasonal_strength() > 0.8);

    // Spikes end up in the residual.
    for &i in &SPIKES {
        assert!(result.residual[i] > 30.0, "residual at {} is {}", i, result.residual[i]);
    }
}

#[test]
fn frequency_detector_finds_every_spike() {
    let values = daily_cycle_with_spikes();
    let result = detect_frequency_outliers(&values, 1.0 / 240.0, 3.0).unwrap();

    for &i in &SPIKES {
        assert!(result.report.is_outlier(i), "spike at {} missed", i);
    }
    let false_positives = result.report.num_outliers - SPIKES.len();
    assert!(false_positives as f64 <= 0.01 * (HOURS - SPIKES.len()) as f64);
    assert_eq!(result.report.num_sample, HOURS);
}

#[test]
fn density_detector_finds_every_spike() {
    let values = daily_cycle_with_spikes();
    let result = detect_density_outliers(&values, 0.01, 50).unwrap();

    for &i in &SPIKES {
        assert!(result.report.is_outlier(i), "spike at {} missed", i);
    }
    assert!(result.report.num_outliers as f64 <= 0.01 * HOURS as f64 + 1.0);
}

#[test]
fn seasonal_spectrogram_peaks_at_daily_frequency() {
    let series = hourly_series(daily_cycle_with_spikes());
    let stl = decompose(series.values(), 24, 25, 169, true).unwrap();
    let seasonal = hourly_series(stl.seasonal);

    let grid = spectrogram(&seasonal, 40, 20).unwrap();
    // 40-sample segments resolve 1/24 between bins 1 and 2; bin 2 is closer.
    assert_eq!(grid.peak_frequency_bin(), Some(2));
    assert_eq!(grid.times[0], series.timestamps()[0]);
    assert_eq!(grid.shape().1, 21);
}

#[test]
fn dashboard_defaults_run_end_to_end() {
    let config = AnalysisConfig::default();
    let series = hourly_series(daily_cycle_with_spikes());

    let stl = config.stl.build().decompose(series.values()).unwrap();
    assert_eq!(stl.observed.len(), HOURS);

    let spc = detect_frequency_outliers(series.values(), config.spc.cutoff, config.spc.k).unwrap();
    let lof = config.lof.fit_predict(series.values()).unwrap();
    let grid = spectrogram(
        &series,
        config.spectrogram.segment_len,
        config.spectrogram.overlap_len,
    )
    .unwrap();

    // Results are handed to the rendering layer as JSON.
    let payload = serde_json::json!({
        "spc": spc.report,
        "lof": lof.report,
        "spectrogram_shape": grid.shape(),
    });
    assert_eq!(payload["spc"]["num_sample"], HOURS);
    assert!(payload["lof"]["ratio_outlier"].as_f64().unwrap() <= 1.01);
    assert_eq!(payload["spectrogram_shape"][1], 21);
}

#[test]
fn missing_values_are_imputed_before_filtering() {
    let mut values = daily_cycle_with_spikes();
    values[100] = f64::NAN;
    values[101] = f64::NAN;
    let result = detect_frequency_outliers(&values, 1.0 / 240.0, 3.0).unwrap();
    assert!(!result.report.is_outlier(100));
    assert!(result.report.is_outlier(SPIKES[0]));

    // Decomposition does not impute.
    assert!(STL::new(24, 25, 169).decompose(&values).is_err());
    let filled = hourly_series(values).filled_with_mean().unwrap();
    assert!(STL::new(24, 25, 169).decompose(filled.values()).is_ok());
}
