//! Norwegian electricity price areas and their reference weather locations.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five Norwegian bidding zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceArea {
    NO1,
    NO2,
    NO3,
    NO4,
    NO5,
}

impl PriceArea {
    /// All price areas in code order.
    pub fn all() -> [PriceArea; 5] {
        [
            PriceArea::NO1,
            PriceArea::NO2,
            PriceArea::NO3,
            PriceArea::NO4,
            PriceArea::NO5,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            PriceArea::NO1 => "NO1",
            PriceArea::NO2 => "NO2",
            PriceArea::NO3 => "NO3",
            PriceArea::NO4 => "NO4",
            PriceArea::NO5 => "NO5",
        }
    }

    /// City whose weather represents the area.
    pub fn city(&self) -> &'static str {
        match self {
            PriceArea::NO1 => "Oslo",
            PriceArea::NO2 => "Kristiansand",
            PriceArea::NO3 => "Trondheim",
            PriceArea::NO4 => "Tromsø",
            PriceArea::NO5 => "Bergen",
        }
    }

    /// `(latitude, longitude)` of the reference city in decimal degrees.
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            PriceArea::NO1 => (59.9127, 10.7461),
            PriceArea::NO2 => (58.1467, 7.9956),
            PriceArea::NO3 => (63.4305, 10.3951),
            PriceArea::NO4 => (69.6489, 18.9551),
            PriceArea::NO5 => (60.393, 5.3242),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates().0
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates().1
    }
}

impl fmt::Display for PriceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PriceArea {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        PriceArea::all()
            .into_iter()
            .find(|area| area.code() == code)
            .ok_or_else(|| AnalysisError::invalid(format!("unknown price area '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("NO3".parse::<PriceArea>().unwrap(), PriceArea::NO3);
        assert_eq!(" no5 ".parse::<PriceArea>().unwrap(), PriceArea::NO5);
        assert!("SE1".parse::<PriceArea>().is_err());
    }

    #[test]
    fn catalogue_is_complete() {
        let areas = PriceArea::all();
        assert_eq!(areas.len(), 5);
        assert_eq!(areas[0].city(), "Oslo");
        assert_eq!(PriceArea::NO4.to_string(), "NO4");
        let (lat, lon) = PriceArea::NO5.coordinates();
        assert!(lat > 60.0 && lon < 6.0);
    }
}
