use serde::{Deserialize, Serialize};

use super::{ApiInfo, Coordinates, ImageMetadata};

/// `GET /v1/transport/traffic-images?date_time=...`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrafficImagesResponse {
    #[serde(default)]
    pub items: Vec<TrafficImagesItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_info: Option<ApiInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrafficImagesItem {
    pub timestamp: String,
    #[serde(default)]
    pub cameras: Vec<TrafficCamera>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrafficCamera {
    pub camera_id: String,
    pub location: Coordinates,
    /// Public URL of the captured frame.
    pub image: String,
    /// Capture time, RFC 3339 with offset (e.g. `2024-03-01T08:00:45+08:00`).
    pub timestamp: String,
    pub image_metadata: ImageMetadata,
}

impl TrafficImagesResponse {
    /// The first (and in practice only) snapshot item.
    pub fn first_item(&self) -> Option<&TrafficImagesItem> {
        self.items.first()
    }
}
