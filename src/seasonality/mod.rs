//! Seasonal-trend decomposition.
//!
//! - STL: Seasonal-Trend decomposition using LOESS

mod stl;

pub use stl::{decompose, DecompositionResult, STL};
