use camcast_schema::{CameraDetailsBody, CameraSnapshotBody, Coordinates, ImageMetadata, RecentLookup};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::snapshot::LocalClock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbArea {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub earliest_timestamp: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCamera {
    pub id: i64,
    pub camera_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_id: i64,
    pub latest_image_id: Option<i64>,
    pub earliest_timestamp: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCameraImage {
    pub id: i64,
    pub camera_id: i64,
    pub content_hash: String,
    pub image_timestamp: DateTime<FixedOffset>,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbWeatherForecast {
    pub id: i64,
    pub area_id: i64,
    pub forecast_timestamp: DateTime<FixedOffset>,
    pub observed_at: i64,
    pub forecast: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub client_id: String,
    pub query_timestamp: i64,
    pub path: String,
    pub params: String,
    pub created_at: DateTime<Utc>,
}

impl DbTransaction {
    pub fn into_recent_lookup(self) -> RecentLookup {
        RecentLookup {
            client_id: self.client_id,
            query_timestamp: self.query_timestamp,
            path: self.path,
            params: serde_json::from_str(&self.params).unwrap_or(serde_json::Value::Null),
            created_at: self.created_at,
        }
    }
}

/// Camera joined with its area name and, when linked, its current image.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct DbCameraSnapshotRow {
    pub camera_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_id: i64,
    pub area_name: String,
    pub image_timestamp: Option<DateTime<FixedOffset>>,
    pub image_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub content_hash: Option<String>,
}

impl DbCameraSnapshotRow {
    /// `None` when the camera has no linked image.
    pub(crate) fn into_snapshot(self) -> Option<CameraSnapshot> {
        Some(CameraSnapshot {
            camera_id: self.camera_id,
            location: Coordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            area_name: self.area_name,
            image: CameraImage {
                timestamp: self.image_timestamp?,
                url: self.image_url?,
                width: self.width?,
                height: self.height?,
                content_hash: self.content_hash?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraImage {
    pub timestamp: DateTime<FixedOffset>,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub content_hash: String,
}

/// A camera as known at some timestamp: its area name and current image.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSnapshot {
    pub camera_id: String,
    pub location: Coordinates,
    pub area_name: String,
    pub image: CameraImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraDetails {
    pub camera: CameraSnapshot,
    pub weather_forecast: String,
}

impl CameraSnapshot {
    pub fn to_body(&self, clock: &LocalClock) -> CameraSnapshotBody {
        CameraSnapshotBody {
            camera_id: self.camera_id.clone(),
            area_name: self.area_name.clone(),
            location: self.location,
            timestamp: clock.format(&self.image.timestamp),
            image: self.image.url.clone(),
            image_metadata: ImageMetadata {
                height: self.image.height,
                width: self.image.width,
                md5: self.image.content_hash.clone(),
            },
        }
    }
}

impl CameraDetails {
    pub fn to_body(&self, clock: &LocalClock) -> CameraDetailsBody {
        CameraDetailsBody {
            camera: self.camera.to_body(clock),
            weather_forecast: self.weather_forecast.clone(),
        }
    }
}

/// A request record to be written to `transactions`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCreate {
    pub client_id: String,
    pub query_timestamp: i64,
    pub path: String,
    pub params: serde_json::Value,
}
