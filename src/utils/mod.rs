//! Shared numerical helpers.

pub mod stats;
pub mod window;

pub use stats::{
    autocorrelation, finite_mean, mean, median, median_abs_deviation, pearson, percentile,
    round_to, trimmed_mean, MAD_NORMAL_SCALE,
};
pub use window::{centered_bounds, moving_average};
