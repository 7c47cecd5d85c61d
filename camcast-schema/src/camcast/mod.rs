//! Response bodies served by camcast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datagov::{Coordinates, ImageMetadata};

/// One camera as known at the requested timestamp, joined with its current
/// image and the name of the weather area it was matched to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CameraSnapshotBody {
    pub camera_id: String,
    pub area_name: String,
    pub location: Coordinates,
    /// Image capture time, `YYYY-MM-DDTHH:mm:ss` local time.
    pub timestamp: String,
    pub image: String,
    pub image_metadata: ImageMetadata,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CameraDetailsBody {
    pub camera: CameraSnapshotBody,
    pub weather_forecast: String,
}

/// A recorded lookup, as served by `/reports/recent`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecentLookup {
    pub client_id: String,
    /// Epoch milliseconds the client asked about.
    pub query_timestamp: i64,
    pub path: String,
    pub params: Value,
    pub created_at: DateTime<Utc>,
}
