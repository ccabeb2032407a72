//! Outlier summary shared by the outlier detectors.

use crate::utils::round_to;
use serde::Serialize;

/// Boolean outlier mask aligned with the input plus summary counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// `true` where the sample was flagged.
    pub mask: Vec<bool>,
    /// Number of samples inspected.
    pub num_sample: usize,
    /// Number of flagged samples.
    pub num_outliers: usize,
    /// Percentage of flagged samples, rounded to 2 decimals.
    pub ratio_outlier: f64,
}

impl OutlierReport {
    /// Build a report from a mask, deriving the counts.
    pub fn from_mask(mask: Vec<bool>) -> Self {
        let num_sample = mask.len();
        let num_outliers = mask.iter().filter(|&&m| m).count();
        let ratio_outlier = if num_sample == 0 {
            0.0
        } else {
            round_to(num_outliers as f64 / num_sample as f64 * 100.0, 2)
        };
        Self {
            mask,
            num_sample,
            num_outliers,
            ratio_outlier,
        }
    }

    /// Indices of flagged samples, ascending.
    pub fn outlier_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check if a specific index was flagged.
    pub fn is_outlier(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }
}
