//! Payload shapes returned by the data.gov.sg v1 snapshot endpoints.
//!
//! Only the fields the indexer reads are modelled; everything else in the
//! upstream documents is ignored on deserialization.

mod traffic;
mod weather;

pub use traffic::{TrafficCamera, TrafficImagesItem, TrafficImagesResponse};
pub use weather::{AreaForecast, AreaMetadata, ValidPeriod, WeatherForecastItem, WeatherForecastResponse};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct ImageMetadata {
    pub height: u32,
    pub width: u32,
    pub md5: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct ApiInfo {
    pub status: String,
}
