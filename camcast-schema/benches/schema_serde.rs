use camcast_schema::{TrafficImagesResponse, WeatherForecastResponse};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

fn traffic_payload(cameras: usize) -> String {
    let cameras: Vec<_> = (0..cameras)
        .map(|i| {
            json!({
                "camera_id": format!("{}", 1000 + i),
                "location": { "latitude": 1.3 + i as f64 * 0.001, "longitude": 103.8 },
                "image": format!("https://images.data.gov.sg/api/traffic-images/{i}.jpg"),
                "timestamp": "2024-03-01T08:00:45+08:00",
                "image_metadata": { "height": 240, "width": 320, "md5": format!("{i:032x}") }
            })
        })
        .collect();
    json!({
        "items": [{ "timestamp": "2024-03-01T08:01:00+08:00", "cameras": cameras }],
        "api_info": { "status": "healthy" }
    })
    .to_string()
}

fn weather_payload(areas: usize) -> String {
    let metadata: Vec<_> = (0..areas)
        .map(|i| json!({ "name": format!("Area {i}"), "label_location": { "latitude": 1.3, "longitude": 103.7 + i as f64 * 0.01 } }))
        .collect();
    let forecasts: Vec<_> = (0..areas)
        .map(|i| json!({ "area": format!("Area {i}"), "forecast": "Partly Cloudy (Day)" }))
        .collect();
    json!({
        "area_metadata": metadata,
        "items": [{ "timestamp": "2024-03-01T08:00:00+08:00", "forecasts": forecasts }],
    })
    .to_string()
}

fn bench_decode(c: &mut Criterion) {
    let traffic = traffic_payload(90);
    let weather = weather_payload(47);

    c.bench_function("decode_traffic_images_90", |b| {
        b.iter(|| {
            let parsed: TrafficImagesResponse =
                serde_json::from_str(black_box(&traffic)).expect("traffic payload");
            black_box(parsed)
        })
    });

    c.bench_function("decode_weather_forecast_47", |b| {
        b.iter(|| {
            let parsed: WeatherForecastResponse =
                serde_json::from_str(black_box(&weather)).expect("weather payload");
            black_box(parsed)
        })
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
