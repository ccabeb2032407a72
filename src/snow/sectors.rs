//! Wind-rose aggregation over 16 compass sectors of 22.5°.

use super::transport::{potential_transport, validate_wind, WindSample};
use crate::error::Result;

pub const SECTOR_COUNT: usize = 16;

const SECTOR_WIDTH: f64 = 360.0 / SECTOR_COUNT as f64;

/// Compass labels, clockwise from north.
pub const SECTOR_LABELS: [&str; SECTOR_COUNT] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Sector of a wind direction; sector 0 is centred on north.
pub fn sector_index(direction: f64) -> usize {
    let shifted = (direction + SECTOR_WIDTH / 2.0).rem_euclid(360.0);
    ((shifted / SECTOR_WIDTH).floor() as usize).min(SECTOR_COUNT - 1)
}

/// Mean wind speed per sector. Sectors without samples are NaN.
pub fn compute_sector_mean_speed(wind: &[WindSample]) -> Result<[f64; SECTOR_COUNT]> {
    validate_wind(wind)?;
    let mut sums = [0.0; SECTOR_COUNT];
    let mut counts = [0usize; SECTOR_COUNT];
    for sample in wind {
        let idx = sector_index(sample.direction);
        sums[idx] += sample.speed;
        counts[idx] += 1;
    }

    let mut means = [f64::NAN; SECTOR_COUNT];
    for (mean, (sum, count)) in means.iter_mut().zip(sums.iter().zip(counts.iter())) {
        if *count > 0 {
            *mean = sum / *count as f64;
        }
    }
    Ok(means)
}

/// Potential transport (kg/m) per sector.
pub fn compute_sector_transport(wind: &[WindSample]) -> Result<[f64; SECTOR_COUNT]> {
    validate_wind(wind)?;
    let mut sectors = [0.0; SECTOR_COUNT];
    for sample in wind {
        sectors[sector_index(sample.direction)] += potential_transport(sample.speed);
    }
    Ok(sectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sector_boundaries() {
        assert_eq!(sector_index(0.0), 0);
        assert_eq!(sector_index(11.24), 0);
        assert_eq!(sector_index(11.25), 1);
        assert_eq!(sector_index(348.75), 0);
        assert_eq!(sector_index(348.74), 15);
        assert_eq!(sector_index(90.0), 4);
        assert_eq!(sector_index(180.0), 8);
        assert_eq!(sector_index(360.0), 0);
        assert_eq!(sector_index(450.0), 4);
    }

    #[test]
    fn mean_speed_per_sector() {
        let wind = [
            WindSample::new(2.0, 0.0),
            WindSample::new(4.0, 5.0),
            WindSample::new(10.0, 90.0),
        ];
        let means = compute_sector_mean_speed(&wind).unwrap();
        assert_relative_eq!(means[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(means[4], 10.0, epsilon = 1e-12);
        assert!(means[8].is_nan());
    }

    #[test]
    fn transport_sums_to_total() {
        let wind: Vec<WindSample> = (0..72)
            .map(|i| WindSample::new(3.0 + (i % 7) as f64, (i * 37 % 360) as f64))
            .collect();
        let sectors = compute_sector_transport(&wind).unwrap();
        let total: f64 = wind.iter().map(|w| potential_transport(w.speed)).sum();
        assert_relative_eq!(sectors.iter().sum::<f64>(), total, epsilon = 1e-9);
    }

    #[test]
    fn rejects_bad_samples() {
        assert!(compute_sector_transport(&[WindSample::new(1.0, f64::INFINITY)]).is_err());
        assert!(compute_sector_mean_speed(&[WindSample::new(-1.0, 10.0)]).is_err());
    }

    #[test]
    fn labels_match_sector_order() {
        assert_eq!(SECTOR_LABELS[sector_index(270.0)], "W");
        assert_eq!(SECTOR_LABELS[sector_index(135.0)], "SE");
    }
}
