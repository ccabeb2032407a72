//! Local Outlier Factor for one-dimensional series.
//!
//! A sample is anomalous when its local reachability density is much lower
//! than that of its nearest neighbours. Scores follow the scikit-learn
//! convention (`-LOF`, lower is more abnormal) and the decision offset is the
//! `contamination` percentile of the scores.

use crate::core::OutlierReport;
use crate::error::{AnalysisError, Result};
use crate::utils::percentile;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Guards the density against duplicate samples (zero reachability).
const DENSITY_EPSILON: f64 = 1e-10;

/// Configuration and entry point of the LOF detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalOutlierFactor {
    /// Neighbourhood size.
    pub n_neighbors: usize,
    /// Expected proportion of outliers, in `(0, 1)`.
    pub contamination: f64,
}

impl Default for LocalOutlierFactor {
    fn default() -> Self {
        Self {
            n_neighbors: 50,
            contamination: 0.01,
        }
    }
}

/// Outcome of a LOF run.
#[derive(Debug, Clone, Serialize)]
pub struct DensityOutlierResult {
    pub report: OutlierReport,
    /// Negative local outlier factor per sample.
    pub scores: Vec<f64>,
    /// Samples scoring strictly below this are outliers.
    pub offset: f64,
}

impl LocalOutlierFactor {
    pub fn new(n_neighbors: usize, contamination: f64) -> Self {
        Self {
            n_neighbors,
            contamination,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(AnalysisError::invalid(format!(
                "contamination must be in (0, 1), got {}",
                self.contamination
            )));
        }
        if self.n_neighbors == 0 {
            return Err(AnalysisError::invalid("n_neighbors must be at least 1"));
        }
        Ok(())
    }

    /// Score every sample and flag the least dense ones.
    pub fn fit_predict(&self, series: &[f64]) -> Result<DensityOutlierResult> {
        self.validate()?;
        let n = series.len();
        if n == 0 {
            return Err(AnalysisError::EmptyData);
        }
        if self.n_neighbors > n - 1 {
            return Err(AnalysisError::invalid(format!(
                "n_neighbors ({}) must be at most n_samples - 1 ({})",
                self.n_neighbors,
                n - 1
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::invalid(
                "series contains non-finite values; fill or drop them first",
            ));
        }
        debug!(
            n,
            n_neighbors = self.n_neighbors,
            contamination = self.contamination,
            "local outlier factor"
        );

        let factors = local_outlier_factors(series, self.n_neighbors);
        let scores: Vec<f64> = factors.iter().map(|f| -f).collect();
        let offset = percentile(&scores, 100.0 * self.contamination);
        let mask: Vec<bool> = scores.iter().map(|&s| s < offset).collect();
        let report = OutlierReport::from_mask(mask);

        debug!(offset, num_outliers = report.num_outliers, "local outlier factor finished");

        Ok(DensityOutlierResult {
            report,
            scores,
            offset,
        })
    }
}

/// Flag density outliers in a one-dimensional series.
pub fn detect_density_outliers(
    series: &[f64],
    contamination: f64,
    n_neighbors: usize,
) -> Result<DensityOutlierResult> {
    LocalOutlierFactor::new(n_neighbors, contamination).fit_predict(series)
}

/// k nearest neighbours of every sample, self excluded.
///
/// Returns, per sample, neighbour indices and distances in non-decreasing
/// distance order.
fn nearest_neighbors(values: &[f64], k: usize) -> Vec<Vec<(usize, f64)>> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut neighbors = vec![Vec::new(); n];
    for (pos, &idx) in order.iter().enumerate() {
        let x = values[idx];
        let mut left = pos;
        let mut right = pos + 1;
        let mut found = Vec::with_capacity(k);

        // Merge outward from the sample's sorted position.
        while found.len() < k {
            let left_dist = if left > 0 { Some(x - values[order[left - 1]]) } else { None };
            let right_dist = if right < n { Some(values[order[right]] - x) } else { None };
            match (left_dist, right_dist) {
                (Some(l), Some(r)) if l <= r => {
                    left -= 1;
                    found.push((order[left], l));
                }
                (_, Some(r)) => {
                    found.push((order[right], r));
                    right += 1;
                }
                (Some(l), None) => {
                    left -= 1;
                    found.push((order[left], l));
                }
                (None, None) => break,
            }
        }
        neighbors[idx] = found;
    }
    neighbors
}

/// Local outlier factor of every sample.
fn local_outlier_factors(values: &[f64], k: usize) -> Vec<f64> {
    let neighbors = nearest_neighbors(values, k);

    let k_distance: Vec<f64> = neighbors
        .iter()
        .map(|nb| nb.last().map(|&(_, d)| d).unwrap_or(0.0))
        .collect();

    let density: Vec<f64> = neighbors
        .iter()
        .map(|nb| {
            let reach: f64 = nb.iter().map(|&(o, d)| d.max(k_distance[o])).sum::<f64>()
                / nb.len() as f64;
            1.0 / (reach + DENSITY_EPSILON)
        })
        .collect();

    neighbors
        .iter()
        .enumerate()
        .map(|(i, nb)| {
            let neighbor_density: f64 =
                nb.iter().map(|&(o, _)| density[o]).sum::<f64>() / nb.len() as f64;
            neighbor_density / density[i]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 190 evenly spaced samples in [0, 10] plus 10 isolated samples above.
    fn separable() -> (Vec<f64>, Vec<usize>) {
        let mut values: Vec<f64> = (0..190).map(|i| 10.0 * i as f64 / 189.0).collect();
        let mut outliers = Vec::new();
        for j in 1..=10 {
            outliers.push(values.len());
            values.push(10.0 + 5.0 * j as f64);
        }
        (values, outliers)
    }

    #[test]
    fn flags_isolated_samples() {
        let (values, outliers) = separable();
        let result = detect_density_outliers(&values, 0.05, 30).unwrap();

        assert_eq!(result.report.num_sample, 200);
        assert_eq!(result.report.outlier_indices(), outliers);
        assert_eq!(result.report.ratio_outlier, 5.0);
    }

    #[test]
    fn flagged_fraction_tracks_contamination() {
        let (values, _) = separable();
        for contamination in [0.01, 0.02, 0.05] {
            let result = detect_density_outliers(&values, contamination, 30).unwrap();
            let expected = contamination * values.len() as f64;
            assert!(
                (result.report.num_outliers as f64 - expected).abs() <= 1.0,
                "contamination {} flagged {}",
                contamination,
                result.report.num_outliers
            );
        }
    }

    #[test]
    fn uniform_grid_has_unit_factor_inside() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let factors = local_outlier_factors(&values, 4);
        for f in &factors[10..90] {
            assert_relative_eq!(*f, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn neighbours_exclude_self_and_are_sorted() {
        let values = [0.0, 1.0, 3.0, 7.0, 15.0];
        let nb = nearest_neighbors(&values, 2);
        assert_eq!(nb[2], vec![(1, 2.0), (0, 3.0)]);
        assert_eq!(nb[0], vec![(1, 1.0), (2, 3.0)]);
        assert_eq!(nb[4], vec![(3, 8.0), (2, 12.0)]);
    }

    #[test]
    fn scores_are_negative_factors() {
        let (values, _) = separable();
        let result = detect_density_outliers(&values, 0.05, 30).unwrap();
        assert!(result.scores.iter().all(|&s| s < 0.0));
        for (i, &s) in result.scores.iter().enumerate() {
            assert_eq!(result.report.is_outlier(i), s < result.offset);
        }
    }

    #[test]
    fn duplicates_do_not_produce_nan() {
        let mut values = vec![1.0; 50];
        values.extend(vec![2.0; 50]);
        values.push(40.0);
        let result = detect_density_outliers(&values, 0.01, 10).unwrap();
        assert!(result.scores.iter().all(|s| s.is_finite()));
        assert!(result.report.is_outlier(100));
    }

    #[test]
    fn rejects_too_many_neighbours() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(detect_density_outliers(&values, 0.1, 9).is_ok());
        assert!(matches!(
            detect_density_outliers(&values, 0.1, 10),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        for contamination in [0.0, 1.0, -0.1, f64::NAN] {
            assert!(matches!(
                detect_density_outliers(&values, contamination, 3),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
        assert!(detect_density_outliers(&values, 0.1, 0).is_err());
        assert_eq!(
            detect_density_outliers(&[], 0.1, 3).unwrap_err(),
            AnalysisError::EmptyData
        );
        assert!(detect_density_outliers(&[1.0, f64::NAN, 2.0], 0.1, 1).is_err());
    }

    #[test]
    fn default_matches_dashboard() {
        let lof = LocalOutlierFactor::default();
        assert_eq!(lof.n_neighbors, 50);
        assert_relative_eq!(lof.contamination, 0.01, epsilon = 1e-15);
    }
}
