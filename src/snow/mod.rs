//! Snow drift estimation from wind and precipitation.
//!
//! [`snow_transport`] applies the Tabler model to one period's snow water
//! equivalent and hourly wind. The season helpers slice hourly
//! weather records into July–June snow years and calendar months, and the
//! sector helpers build wind-rose aggregates over 16 compass sectors.

mod season;
mod sectors;
mod transport;

pub use season::{
    average_sector_transport, monthly_transport, season_label, seasonal_transport, snow_year_window,
    swe_total, MonthlyTransport, SeasonTransport, WeatherRecord,
};
pub use sectors::{
    compute_sector_mean_speed, compute_sector_transport, sector_index, SECTOR_COUNT, SECTOR_LABELS,
};
pub use transport::{
    snow_transport, SnowDriftParams, SnowTransportResult, TransportControl, WindSample, SAMPLE_SECONDS,
};
