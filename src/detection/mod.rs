//! Outlier detection for hourly series.
//!
//! Two independent detectors:
//! - [`detect_frequency_outliers`]: statistical process control around a
//!   DCT low-pass trend
//! - [`detect_density_outliers`]: local outlier factor on the sample values

mod lof;
mod spc;

pub use lof::{detect_density_outliers, DensityOutlierResult, LocalOutlierFactor};
#[allow(deprecated)]
pub use spc::detect_trimmed_mean_outliers;
pub use spc::{detect_frequency_outliers, FrequencyOutlierResult, SpcConfig};
