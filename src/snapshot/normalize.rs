use camcast_schema::{TrafficImagesResponse, WeatherForecastResponse};
use chrono::{DateTime, FixedOffset};
use tracing::warn;

use super::{AreaRecord, CameraRecord, ForecastRecord, SnapshotResult, WeatherSnapshot};
use crate::error::{FetchError, SnapshotApi};

fn parse_upstream_time(api: SnapshotApi, field: &str, raw: &str) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| FetchError::payload(api, format!("{field} {raw:?} is not RFC 3339: {e}")))
}

/// Flattens `items[0].cameras` into camera records.
pub fn normalize_traffic(payload: &TrafficImagesResponse) -> Result<Vec<CameraRecord>, FetchError> {
    let api = SnapshotApi::TrafficImages;
    let item = payload
        .first_item()
        .ok_or_else(|| FetchError::payload(api, "items is empty"))?;

    item.cameras
        .iter()
        .map(|camera| {
            if camera.camera_id.is_empty() {
                return Err(FetchError::payload(api, "camera_id is empty"));
            }
            if camera.image_metadata.md5.is_empty() {
                return Err(FetchError::payload(
                    api,
                    format!("camera {} has no image md5", camera.camera_id),
                ));
            }
            Ok(CameraRecord {
                camera_id: camera.camera_id.clone(),
                location: camera.location,
                image_timestamp: parse_upstream_time(api, "timestamp", &camera.timestamp)?,
                image_url: camera.image.clone(),
                width: camera.image_metadata.width,
                height: camera.image_metadata.height,
                content_hash: camera.image_metadata.md5.clone(),
            })
        })
        .collect()
}

/// Pulls area metadata and `items[0].forecasts` out of the weather payload.
///
/// Forecasts naming an area without metadata cannot be attached to an area
/// and are dropped.
pub fn normalize_weather(payload: &WeatherForecastResponse) -> Result<WeatherSnapshot, FetchError> {
    let api = SnapshotApi::WeatherForecast;
    let item = payload
        .first_item()
        .ok_or_else(|| FetchError::payload(api, "items is empty"))?;

    let areas: Vec<AreaRecord> = payload
        .area_metadata
        .iter()
        .map(|area| AreaRecord {
            name: area.name.clone(),
            location: area.label_location,
        })
        .collect();

    let forecasts = item
        .forecasts
        .iter()
        .filter(|forecast| {
            let known = areas.iter().any(|area| area.name == forecast.area);
            if !known {
                warn!(area = %forecast.area, "Forecast for area without metadata dropped");
            }
            known
        })
        .map(|forecast| ForecastRecord {
            area_name: forecast.area.clone(),
            forecast_text: forecast.forecast.clone(),
        })
        .collect();

    Ok(WeatherSnapshot {
        areas,
        forecasts,
        forecast_timestamp: parse_upstream_time(api, "timestamp", &item.timestamp)?,
    })
}

/// Joins both normalized halves. Cameras with no area to be matched against
/// make the weather payload unusable.
pub fn snapshot_from_payloads(
    traffic: &TrafficImagesResponse,
    weather: &WeatherForecastResponse,
) -> Result<SnapshotResult, FetchError> {
    let cameras = normalize_traffic(traffic)?;
    let weather = normalize_weather(weather)?;

    if !cameras.is_empty() && weather.areas.is_empty() {
        return Err(FetchError::payload(
            SnapshotApi::WeatherForecast,
            "area_metadata is empty",
        ));
    }

    Ok(SnapshotResult {
        cameras,
        areas: weather.areas,
        forecasts: weather.forecasts,
        forecast_timestamp: weather.forecast_timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn traffic() -> TrafficImagesResponse {
        serde_json::from_value(json!({
            "items": [{
                "timestamp": "2024-03-01T08:01:00+08:00",
                "cameras": [{
                    "camera_id": "1701",
                    "location": { "latitude": 1.323604, "longitude": 103.872856 },
                    "image": "https://images.data.gov.sg/api/traffic-images/2024/03/1701.jpg",
                    "timestamp": "2024-03-01T08:00:45+08:00",
                    "image_metadata": { "height": 240, "width": 320, "md5": "3f2a9d" }
                }]
            }],
            "api_info": { "status": "healthy" }
        }))
        .expect("traffic fixture")
    }

    fn weather() -> WeatherForecastResponse {
        serde_json::from_value(json!({
            "area_metadata": [
                { "name": "Geylang", "label_location": { "latitude": 1.318, "longitude": 103.884 } },
                { "name": "Bishan", "label_location": { "latitude": 1.350772, "longitude": 103.839 } }
            ],
            "items": [{
                "update_timestamp": "2024-03-01T07:59:00+08:00",
                "timestamp": "2024-03-01T07:30:00+08:00",
                "valid_period": { "start": "2024-03-01T07:30:00+08:00", "end": "2024-03-01T09:30:00+08:00" },
                "forecasts": [
                    { "area": "Geylang", "forecast": "Partly Cloudy (Day)" },
                    { "area": "Bishan", "forecast": "Light Rain" },
                    { "area": "Atlantis", "forecast": "Fair" }
                ]
            }]
        }))
        .expect("weather fixture")
    }

    #[test]
    fn traffic_cameras_are_flattened() {
        let cameras = normalize_traffic(&traffic()).unwrap();
        assert_eq!(cameras.len(), 1);
        let cam = &cameras[0];
        assert_eq!(cam.camera_id, "1701");
        assert_eq!(cam.content_hash, "3f2a9d");
        assert_eq!((cam.width, cam.height), (320, 240));
        assert_eq!(cam.image_timestamp.to_rfc3339(), "2024-03-01T08:00:45+08:00");
    }

    #[test]
    fn unknown_forecast_areas_are_dropped() {
        let snapshot = normalize_weather(&weather()).unwrap();
        assert_eq!(snapshot.areas.len(), 2);
        let names: Vec<_> = snapshot.forecasts.iter().map(|f| f.area_name.as_str()).collect();
        assert_eq!(names, ["Geylang", "Bishan"]);
        assert_eq!(
            snapshot.forecast_timestamp.to_rfc3339(),
            "2024-03-01T07:30:00+08:00"
        );
    }

    #[test]
    fn empty_items_is_a_payload_error() {
        let err = normalize_traffic(&TrafficImagesResponse::default()).unwrap_err();
        assert!(matches!(
            err,
            FetchError::Payload {
                api: SnapshotApi::TrafficImages,
                ..
            }
        ));
        let err = normalize_weather(&WeatherForecastResponse::default()).unwrap_err();
        assert!(matches!(
            err,
            FetchError::Payload {
                api: SnapshotApi::WeatherForecast,
                ..
            }
        ));
    }

    #[test]
    fn bad_image_timestamp_is_a_payload_error() {
        let mut payload = traffic();
        payload.items[0].cameras[0].timestamp = "yesterday".to_string();
        assert!(matches!(
            normalize_traffic(&payload),
            Err(FetchError::Payload { .. })
        ));
    }

    #[test]
    fn missing_md5_is_a_payload_error() {
        let mut payload = traffic();
        payload.items[0].cameras[0].image_metadata.md5.clear();
        assert!(normalize_traffic(&payload).is_err());
    }

    #[test]
    fn cameras_without_areas_cannot_be_joined() {
        let mut weather = weather();
        weather.area_metadata.clear();
        let err = snapshot_from_payloads(&traffic(), &weather).unwrap_err();
        assert!(err.to_string().contains("area_metadata is empty"));
    }

    #[test]
    fn joined_snapshot_carries_both_halves() {
        let snapshot = snapshot_from_payloads(&traffic(), &weather()).unwrap();
        assert_eq!(snapshot.cameras.len(), 1);
        assert_eq!(snapshot.areas.len(), 2);
        assert_eq!(snapshot.forecasts.len(), 2);
    }
}
