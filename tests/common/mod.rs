#![allow(dead_code)]

use camcast::snapshot::{AreaRecord, CameraRecord, ForecastRecord, SnapshotResult};
use camcast_schema::Coordinates;
use chrono::{DateTime, FixedOffset};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fresh SQLite file under the temp dir, unique per call.
pub fn temp_database_url(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "camcast-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    format!("sqlite:{}", temp_path.display())
}

pub fn sgt(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).expect("valid rfc3339 timestamp")
}

pub fn area(name: &str, latitude: f64, longitude: f64) -> AreaRecord {
    AreaRecord {
        name: name.to_string(),
        location: Coordinates {
            latitude,
            longitude,
        },
    }
}

pub fn forecast(area_name: &str, text: &str) -> ForecastRecord {
    ForecastRecord {
        area_name: area_name.to_string(),
        forecast_text: text.to_string(),
    }
}

pub fn camera(camera_id: &str, latitude: f64, longitude: f64, hash: &str) -> CameraRecord {
    CameraRecord {
        camera_id: camera_id.to_string(),
        location: Coordinates {
            latitude,
            longitude,
        },
        image_timestamp: sgt("2024-03-01T08:00:45+08:00"),
        image_url: format!("https://images.data.gov.sg/api/traffic-images/{camera_id}/{hash}.jpg"),
        width: 320,
        height: 240,
        content_hash: hash.to_string(),
    }
}

/// Areas Alpha (0,0) and Bravo (10,10); cam-1 sits next to Alpha, cam-2 next
/// to Bravo.
pub fn sample_snapshot(alpha_forecast: &str) -> SnapshotResult {
    SnapshotResult {
        cameras: vec![
            camera("cam-1", 0.1, 0.1, "hash-1"),
            camera("cam-2", 9.9, 9.9, "hash-2"),
        ],
        areas: vec![area("Alpha", 0.0, 0.0), area("Bravo", 10.0, 10.0)],
        forecasts: vec![
            forecast("Alpha", alpha_forecast),
            forecast("Bravo", "Fair (Day)"),
        ],
        forecast_timestamp: sgt("2024-03-01T07:30:00+08:00"),
    }
}

pub fn traffic_payload() -> serde_json::Value {
    serde_json::json!({
        "items": [{
            "timestamp": "2024-03-01T08:01:00+08:00",
            "cameras": [
                {
                    "camera_id": "1701",
                    "location": { "latitude": 1.323604, "longitude": 103.872856 },
                    "image": "https://images.data.gov.sg/api/traffic-images/2024/03/1701.jpg",
                    "timestamp": "2024-03-01T08:00:45+08:00",
                    "image_metadata": { "height": 240, "width": 320, "md5": "3f2a9d" }
                },
                {
                    "camera_id": "1702",
                    "location": { "latitude": 1.349, "longitude": 103.84 },
                    "image": "https://images.data.gov.sg/api/traffic-images/2024/03/1702.jpg",
                    "timestamp": "2024-03-01T08:00:45+08:00",
                    "image_metadata": { "height": 240, "width": 320, "md5": "9c01be" }
                }
            ]
        }],
        "api_info": { "status": "healthy" }
    })
}

pub fn weather_payload() -> serde_json::Value {
    serde_json::json!({
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
                { "area": "Bishan", "forecast": "Light Rain" }
            ]
        }],
        "api_info": { "status": "healthy" }
    })
}

/// Serves `router` on an ephemeral localhost port.
pub async fn spawn_upstream(router: axum::Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream addr");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("fake upstream server failed");
    });
    addr
}

/// Upstream config pointing both endpoints at a fake server.
pub fn upstream_config(addr: std::net::SocketAddr) -> camcast::config::UpstreamConfig {
    let mut cfg = camcast::config::UpstreamConfig::default();
    cfg.traffic_images_url = url::Url::parse(&format!("http://{addr}/traffic-images"))
        .expect("traffic url");
    cfg.weather_forecast_url = url::Url::parse(&format!("http://{addr}/weather-forecast"))
        .expect("weather url");
    cfg.request_timeout_secs = 5;
    cfg
}

/// Singapore time, the zone the upstream expects.
pub fn sgt_clock() -> camcast::snapshot::LocalClock {
    camcast::snapshot::LocalClock::fixed(FixedOffset::east_opt(8 * 3600).expect("valid offset"))
}

/// 2024-03-01T08:00:00+08:00
pub const MARCH_FIRST_8AM: i64 = 1_709_251_200_000;
