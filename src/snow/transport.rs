//! Tabler (2003) snow transport model.
//!
//! Transport is the smaller of what the wind can carry (`Qupot`) and what the
//! snowfall can supply (`Qspot`), reduced for a finite fetch distance.

use super::sectors::{compute_sector_mean_speed, compute_sector_transport, SECTOR_COUNT};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Duration of one wind sample in seconds (hourly data).
pub const SAMPLE_SECONDS: f64 = 3600.0;

const WIND_EXPONENT: f64 = 3.8;
const TRANSPORT_DIVISOR: f64 = 233_847.0;
const FETCH_DECAY: f64 = 0.14;

/// Model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowDriftParams {
    /// Maximum transport distance `T` in metres.
    #[serde(alias = "t")]
    pub transport_distance: f64,
    /// Fetch distance `F` in metres.
    #[serde(alias = "f")]
    pub fetch_distance: f64,
    /// Relocation coefficient, share of snowfall available for transport.
    pub theta: f64,
    /// Air temperature (°C) below which precipitation counts as snow.
    pub freezing_threshold: f64,
}

impl Default for SnowDriftParams {
    fn default() -> Self {
        Self {
            transport_distance: 3000.0,
            fetch_distance: 30_000.0,
            theta: 0.5,
            freezing_threshold: 1.0,
        }
    }
}

impl SnowDriftParams {
    pub fn new(transport_distance: f64, fetch_distance: f64, theta: f64) -> Self {
        Self {
            transport_distance,
            fetch_distance,
            theta,
            ..Self::default()
        }
    }

    pub fn with_freezing_threshold(mut self, threshold: f64) -> Self {
        self.freezing_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.transport_distance.is_finite() || self.transport_distance <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "transport distance T must be positive, got {}",
                self.transport_distance
            )));
        }
        if !self.fetch_distance.is_finite() || self.fetch_distance < 0.0 {
            return Err(AnalysisError::invalid(format!(
                "fetch distance F must be non-negative, got {}",
                self.fetch_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(AnalysisError::invalid(format!(
                "theta must be in [0, 1], got {}",
                self.theta
            )));
        }
        if !self.freezing_threshold.is_finite() {
            return Err(AnalysisError::invalid("freezing threshold must be finite"));
        }
        Ok(())
    }
}

/// One hourly wind observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Speed in m/s.
    pub speed: f64,
    /// Direction the wind blows from, degrees clockwise from north.
    pub direction: f64,
}

impl WindSample {
    pub fn new(speed: f64, direction: f64) -> Self {
        Self { speed, direction }
    }
}

/// Which supply limits the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportControl {
    /// Wind could carry more than fell: `Qupot > Qspot`.
    SnowfallControlled,
    WindControlled,
}

/// Transport quantities in kg per metre of width.
#[derive(Debug, Clone, Serialize)]
pub struct SnowTransportResult {
    /// Potential wind-driven transport.
    pub qupot: f64,
    /// Potential snowfall-driven transport.
    pub qspot: f64,
    /// Relocated water equivalent.
    pub srwe: f64,
    /// Transport at infinite fetch.
    pub qinf: f64,
    /// Transport at the configured fetch.
    pub qt: f64,
    pub control: TransportControl,
    /// Mean wind speed per compass sector, NaN where no sample fell.
    pub sector_mean_speed: [f64; SECTOR_COUNT],
    /// Potential transport per compass sector.
    pub sector_transport: [f64; SECTOR_COUNT],
}

impl SnowTransportResult {
    /// `qt` in tonnes per metre.
    pub fn qt_tonnes(&self) -> f64 {
        self.qt / 1000.0
    }
}

/// Potential transport of one wind sample.
pub(crate) fn potential_transport(speed: f64) -> f64 {
    speed.powf(WIND_EXPONENT) * SAMPLE_SECONDS / TRANSPORT_DIVISOR
}

pub(crate) fn validate_wind(wind: &[WindSample]) -> Result<()> {
    for (i, sample) in wind.iter().enumerate() {
        if !sample.speed.is_finite() || sample.speed < 0.0 {
            return Err(AnalysisError::invalid(format!(
                "wind speed at index {} must be finite and non-negative, got {}",
                i, sample.speed
            )));
        }
        if !sample.direction.is_finite() || sample.direction < 0.0 {
            return Err(AnalysisError::invalid(format!(
                "wind direction at index {} must be finite and non-negative, got {}",
                i, sample.direction
            )));
        }
    }
    Ok(())
}

/// Estimate snow transport for a period.
///
/// `total_swe` is the snow water equivalent (mm) that fell over the period
/// and `wind` its hourly wind samples.
pub fn snow_transport(
    params: &SnowDriftParams,
    total_swe: f64,
    wind: &[WindSample],
) -> Result<SnowTransportResult> {
    params.validate()?;
    if !total_swe.is_finite() || total_swe < 0.0 {
        return Err(AnalysisError::invalid(format!(
            "total SWE must be finite and non-negative, got {}",
            total_swe
        )));
    }
    validate_wind(wind)?;

    let t = params.transport_distance;
    let qupot: f64 = wind.iter().map(|w| potential_transport(w.speed)).sum();
    let qspot = 0.5 * t * total_swe;
    let srwe = params.theta * total_swe;

    let (control, qinf) = if qupot > qspot {
        (TransportControl::SnowfallControlled, 0.5 * t * srwe)
    } else {
        (TransportControl::WindControlled, qupot)
    };
    let qt = qinf * (1.0 - FETCH_DECAY.powf(params.fetch_distance / t));

    debug!(
        samples = wind.len(),
        total_swe,
        qupot,
        qspot,
        qt,
        ?control,
        "snow transport"
    );

    Ok(SnowTransportResult {
        qupot,
        qspot,
        srwe,
        qinf,
        qt,
        control,
        sector_mean_speed: compute_sector_mean_speed(wind)?,
        sector_transport: compute_sector_transport(wind)?,
    })
}
