//! Analysis settings loaded from TOML.
//!
//! Every section is optional; missing sections and keys take the dashboard
//! defaults.
//!
//! ```toml
//! [stl]
//! period = 24
//! seasonal_window = 41
//! trend_window = 721
//! robust = true
//!
//! [spc]
//! cutoff = 0.004166666666666667
//! k = 3.0
//!
//! [lof]
//! contamination = 0.01
//! n_neighbors = 50
//!
//! [spectrogram]
//! segment_len = 40
//! overlap_len = 20
//!
//! [snow_drift]
//! t = 3000.0
//! f = 30000.0
//! theta = 0.5
//! freezing_threshold = 1.0
//! ```

use crate::detection::{LocalOutlierFactor, SpcConfig};
use crate::error::{AnalysisError, Result};
use crate::seasonality::STL;
use crate::snow::SnowDriftParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// STL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StlConfig {
    pub period: usize,
    pub seasonal_window: usize,
    pub trend_window: usize,
    pub robust: bool,
}

impl Default for StlConfig {
    fn default() -> Self {
        Self {
            period: 24,
            seasonal_window: 41,
            trend_window: 721,
            robust: true,
        }
    }
}

impl StlConfig {
    /// Decomposer with these settings.
    pub fn build(&self) -> STL {
        let stl = STL::new(self.period, self.seasonal_window, self.trend_window);
        if self.robust {
            stl.robust()
        } else {
            stl
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.build().validate_parameters()
    }
}

/// Spectrogram settings, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    pub segment_len: usize,
    pub overlap_len: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            segment_len: 40,
            overlap_len: 20,
        }
    }
}

impl SpectrogramConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segment_len == 0 {
            return Err(AnalysisError::invalid("segment_len must be positive"));
        }
        if self.overlap_len >= self.segment_len {
            return Err(AnalysisError::invalid(format!(
                "overlap_len ({}) must be smaller than segment_len ({})",
                self.overlap_len, self.segment_len
            )));
        }
        Ok(())
    }
}

/// All analysis settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub stl: StlConfig,
    pub spc: SpcConfig,
    pub lof: LocalOutlierFactor,
    pub spectrogram: SpectrogramConfig,
    pub snow_drift: SnowDriftParams,
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(source).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loading analysis config");
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Check every section with the rules its component applies.
    pub fn validate(&self) -> Result<()> {
        self.stl.validate()?;
        self.spc.validate()?;
        self.lof.validate()?;
        self.spectrogram.validate()?;
        self.snow_drift.validate()?;
        Ok(())
    }
}
