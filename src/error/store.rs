use std::fmt;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    Actor(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// What a read was looking for when it came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    Cameras,
    Camera,
    CameraImage,
    WeatherForecast,
}

impl NotFound {
    pub fn code(self) -> &'static str {
        match self {
            NotFound::Cameras => "CAMERAS_NOT_FOUND",
            NotFound::Camera => "CAMERA_NOT_FOUND",
            NotFound::CameraImage => "CAMERA_IMAGE_NOT_FOUND",
            NotFound::WeatherForecast => "WEATHER_FORECAST_NOT_FOUND",
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a store read that did not produce a row set.
///
/// `NotFound` is the cache-miss signal; `Store` is a real failure.
#[derive(Debug, ThisError)]
pub enum ReadError {
    #[error("Not found: {0}")]
    NotFound(NotFound),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ReadError {
    fn from(e: sqlx::Error) -> Self {
        ReadError::Store(StoreError::Database(e))
    }
}
