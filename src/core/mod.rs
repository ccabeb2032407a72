//! Core data structures shared by the analysis components.

mod hourly_series;
mod price_area;
mod report;

pub(crate) use hourly_series::fill_non_finite;
pub use hourly_series::HourlySeries;
pub use price_area::PriceArea;
pub use report::OutlierReport;
