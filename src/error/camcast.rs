use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

use super::{FetchError, NotFound, ReadError, StoreError};

/// Failure of the reindex path, or of the store outside a plain miss.
#[derive(Debug, ThisError)]
pub enum UpstreamFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, ThisError)]
pub enum CamcastError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(NotFound),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] UpstreamFailure),
}

impl From<FetchError> for CamcastError {
    fn from(e: FetchError) -> Self {
        CamcastError::Upstream(UpstreamFailure::Fetch(e))
    }
}

impl From<StoreError> for CamcastError {
    fn from(e: StoreError) -> Self {
        CamcastError::Upstream(UpstreamFailure::Store(e))
    }
}

impl From<ReadError> for CamcastError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::NotFound(kind) => CamcastError::NotFound(kind),
            ReadError::Store(err) => err.into(),
        }
    }
}

impl IntoResponse for CamcastError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            CamcastError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            CamcastError::NotFound(kind) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: kind.code().to_string(),
                    message: "No snapshot data for the requested timestamp.".to_string(),
                    details: None,
                },
            ),

            CamcastError::Upstream(UpstreamFailure::Fetch(FetchError::Payload { .. })) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "BAD_UPSTREAM_PAYLOAD".to_string(),
                    message: "Failed to parse upstream response.".to_string(),
                    details: None,
                },
            ),

            CamcastError::Upstream(UpstreamFailure::Fetch(FetchError::Timeout { .. })) => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiErrorObject {
                    code: "UPSTREAM_TIMEOUT".to_string(),
                    message: "Upstream service timed out.".to_string(),
                    details: None,
                },
            ),

            CamcastError::Upstream(UpstreamFailure::Fetch(_)) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: "Upstream service error.".to_string(),
                    details: None,
                },
            ),

            CamcastError::Upstream(UpstreamFailure::Store(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotApi;
    use axum::body::to_bytes;
    use std::time::Duration;

    fn status_of(err: CamcastError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            status_of(CamcastError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ReadError::NotFound(NotFound::Camera).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FetchError::payload(SnapshotApi::TrafficImages, "items is empty").into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(
                FetchError::Timeout {
                    api: SnapshotApi::WeatherForecast,
                    after: Duration::from_secs(30),
                }
                .into()
            ),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(StoreError::Timeout(Duration::from_secs(10)).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn not_found_body_carries_kind_code() {
        let resp = CamcastError::NotFound(NotFound::Cameras).into_response();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "CAMERAS_NOT_FOUND");
        assert!(body["error"].get("details").is_none());
    }
}
