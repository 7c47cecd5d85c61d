use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Which of the two snapshot endpoints an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotApi {
    TrafficImages,
    WeatherForecast,
}

impl fmt::Display for SnapshotApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotApi::TrafficImages => "traffic-images",
            SnapshotApi::WeatherForecast => "weather-forecast",
        })
    }
}

#[derive(Debug, ThisError)]
pub enum FetchError {
    #[error("[{api}] HTTP request error: {error}")]
    Transport {
        api: SnapshotApi,
        #[source]
        error: reqwest::Error,
    },

    #[error("[{api}] Upstream error with status: {status}")]
    Status { api: SnapshotApi, status: StatusCode },

    #[error("[{api}] Malformed payload: {reason}")]
    Payload { api: SnapshotApi, reason: String },

    #[error("[{api}] Timed out after {after:?}")]
    Timeout { api: SnapshotApi, after: Duration },

    #[error("Timestamp {0} has no local-time representation")]
    InvalidTimestamp(i64),
}

impl FetchError {
    pub(crate) fn from_reqwest(api: SnapshotApi, error: reqwest::Error, after: Duration) -> Self {
        if error.is_timeout() {
            FetchError::Timeout { api, after }
        } else if error.is_decode() {
            FetchError::Payload {
                api,
                reason: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status { api, status }
        } else {
            FetchError::Transport { api, error }
        }
    }

    pub(crate) fn payload(api: SnapshotApi, reason: impl Into<String>) -> Self {
        FetchError::Payload {
            api,
            reason: reason.into(),
        }
    }
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => status.is_server_error(),
            FetchError::Payload { .. } | FetchError::InvalidTimestamp(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        let api = SnapshotApi::TrafficImages;
        assert!(
            FetchError::Status {
                api,
                status: StatusCode::BAD_GATEWAY
            }
            .is_retryable()
        );
        assert!(
            !FetchError::Status {
                api,
                status: StatusCode::NOT_FOUND
            }
            .is_retryable()
        );
        assert!(!FetchError::payload(api, "no items").is_retryable());
        assert!(
            FetchError::Timeout {
                api,
                after: Duration::from_secs(1)
            }
            .is_retryable()
        );
    }

    #[test]
    fn display_names_the_endpoint() {
        let err = FetchError::payload(SnapshotApi::WeatherForecast, "items is empty");
        assert_eq!(
            err.to_string(),
            "[weather-forecast] Malformed payload: items is empty"
        );
    }
}
