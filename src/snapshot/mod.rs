//! Fetching and normalizing the two upstream snapshots for one timestamp.
//!
//! Layout:
//! - `clock.rs`: epoch-millisecond timestamps rendered as upstream local time
//! - `normalize.rs`: data.gov.sg payloads -> [`SnapshotResult`]
//! - `client.rs`: the reqwest-backed [`SnapshotFetcher`]

mod client;
mod clock;
mod normalize;
mod retry;

pub use client::HttpSnapshotFetcher;
pub use clock::{LOCAL_TIME_FORMAT, LocalClock};
pub use normalize::{normalize_traffic, normalize_weather, snapshot_from_payloads};

use crate::error::FetchError;
use async_trait::async_trait;
use camcast_schema::Coordinates;
use chrono::{DateTime, FixedOffset};

/// Epoch milliseconds, the unit every timestamp in the store and API uses.
pub type EpochMillis = i64;

/// One camera as observed in a traffic snapshot, with its current image.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRecord {
    pub camera_id: String,
    pub location: Coordinates,
    pub image_timestamp: DateTime<FixedOffset>,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    /// md5 of the image bytes as reported upstream; the image dedup key.
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub name: String,
    pub location: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    pub area_name: String,
    pub forecast_text: String,
}

/// Normalized weather half of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub areas: Vec<AreaRecord>,
    pub forecasts: Vec<ForecastRecord>,
    pub forecast_timestamp: DateTime<FixedOffset>,
}

/// Both halves of a snapshot for one requested timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotResult {
    pub cameras: Vec<CameraRecord>,
    pub areas: Vec<AreaRecord>,
    pub forecasts: Vec<ForecastRecord>,
    pub forecast_timestamp: DateTime<FixedOffset>,
}

/// Source of snapshots; the HTTP implementation is [`HttpSnapshotFetcher`].
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetches and normalizes both snapshots for `timestamp`. Either both
    /// succeed or the whole fetch fails.
    async fn fetch(&self, timestamp: EpochMillis) -> Result<SnapshotResult, FetchError>;
}
