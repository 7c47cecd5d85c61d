pub mod camcast;
pub mod datagov;

pub use camcast::{CameraDetailsBody, CameraSnapshotBody, RecentLookup};
pub use datagov::{Coordinates, ImageMetadata, TrafficImagesResponse, WeatherForecastResponse};
