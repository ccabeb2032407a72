//! # gridwatch-analysis
//!
//! Signal-analysis core of an electricity and weather dashboard for the
//! Norwegian price areas NO1–NO5.
//!
//! Provides STL decomposition, DCT-based SPC outlier detection, local
//! outlier factor anomaly detection, STFT spectrograms, Tabler snow drift
//! estimation with wind-rose sectors, and lagged energy/weather correlation.
//! Every operation is a pure function over caller-owned data that returns a
//! serializable result or an [`AnalysisError`].

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod correlation;
pub mod detection;
pub mod error;
pub mod seasonality;
pub mod snow;
pub mod spectral;
pub mod utils;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::core::{HourlySeries, OutlierReport, PriceArea};
    pub use crate::correlation::{lagged_correlation, sliding_window_correlation};
    pub use crate::detection::{detect_density_outliers, detect_frequency_outliers};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::seasonality::{decompose, STL};
    pub use crate::snow::{snow_transport, SnowDriftParams, WeatherRecord, WindSample};
    pub use crate::spectral::spectrogram;
}
