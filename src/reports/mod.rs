//! Request analytics: one row per served lookup, written off the request path.

use camcast_schema::RecentLookup;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::{CameraDetails, LookupStore, TransactionCreate};
use crate::error::StoreError;
use crate::snapshot::EpochMillis;

#[derive(Clone)]
pub struct LookupRecorder {
    store: Arc<dyn LookupStore>,
}

impl LookupRecorder {
    pub fn new(store: Arc<dyn LookupStore>) -> Self {
        Self { store }
    }

    /// Queue a record on a spawned task. Failures are logged and dropped.
    pub fn record(
        &self,
        client_id: String,
        query_timestamp: EpochMillis,
        path: &str,
        params: Value,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let create = TransactionCreate {
            client_id,
            query_timestamp,
            path: trim_trailing_slashes(path).to_string(),
            params,
        };
        tokio::spawn(async move {
            match store.create_transaction(create).await {
                Ok(id) => debug!(id, "Lookup recorded"),
                Err(e) => warn!(error = %e, "Failed to record lookup"),
            }
        })
    }

    /// Most recent lookups, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<RecentLookup>, StoreError> {
        let rows = self.store.recent_transactions(limit).await?;
        Ok(rows.into_iter().map(|r| r.into_recent_lookup()).collect())
    }
}

pub fn trim_trailing_slashes(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Fields of a details lookup kept for reporting.
pub fn details_params(details: &CameraDetails) -> Value {
    let camera = &details.camera;
    json!({
        "latitude": camera.location.latitude,
        "longitude": camera.location.longitude,
        "weather_forecast": details.weather_forecast,
        "area_name": camera.area_name,
        "md5": camera.image.content_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CameraImage, CameraSnapshot};
    use camcast_schema::Coordinates;
    use chrono::DateTime;

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(trim_trailing_slashes("/cameras/"), "/cameras");
        assert_eq!(trim_trailing_slashes("/cameras/1701//"), "/cameras/1701");
        assert_eq!(trim_trailing_slashes("/cameras"), "/cameras");
    }

    #[test]
    fn details_params_carry_location_forecast_and_hash() {
        let details = CameraDetails {
            camera: CameraSnapshot {
                camera_id: "1701".to_string(),
                location: Coordinates {
                    latitude: 1.3,
                    longitude: 103.8,
                },
                area_name: "Bishan".to_string(),
                image: CameraImage {
                    timestamp: DateTime::parse_from_rfc3339("2024-03-01T08:00:00+08:00")
                        .expect("valid timestamp"),
                    url: "https://images.example/1701.jpg".to_string(),
                    width: 320,
                    height: 240,
                    content_hash: "abc".to_string(),
                },
            },
            weather_forecast: "Cloudy".to_string(),
        };

        let params = details_params(&details);
        assert_eq!(params["area_name"], "Bishan");
        assert_eq!(params["weather_forecast"], "Cloudy");
        assert_eq!(params["md5"], "abc");
        assert_eq!(params["latitude"], 1.3);
    }
}
