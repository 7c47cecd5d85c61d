use crate::error::CamcastError;
use crate::snapshot::EpochMillis;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// `?timestamp=<epoch ms>`, required and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotTimestamp(pub EpochMillis);

impl<S> FromRequestParts<S> for SnapshotTimestamp
where
    S: Send + Sync,
{
    type Rejection = CamcastError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .uri
            .query()
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(k, _)| k == "timestamp")
                    .map(|(_, v)| v.into_owned())
            })
            .ok_or_else(|| CamcastError::Validation("missing timestamp".to_string()))?;

        parse_timestamp(&raw).map(SnapshotTimestamp)
    }
}

pub fn parse_timestamp(raw: &str) -> Result<EpochMillis, CamcastError> {
    let value = raw.trim().parse::<EpochMillis>().map_err(|e| {
        debug!(raw, error = %e, "Rejected timestamp");
        CamcastError::Validation(format!("timestamp must be epoch milliseconds, got {raw:?}"))
    })?;
    if value < 0 {
        return Err(CamcastError::Validation(
            "timestamp must not be negative".to_string(),
        ));
    }
    if DateTime::<Utc>::from_timestamp_millis(value).is_none() {
        return Err(CamcastError::Validation(format!(
            "timestamp {value} is out of range"
        )));
    }
    Ok(value)
}

/// `/cameras/{camera_id}` with a non-empty id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraId(pub String);

impl<S> FromRequestParts<S> for CameraId
where
    S: Send + Sync,
{
    type Rejection = CamcastError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(camera_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| CamcastError::Validation(e.body_text()))?;

        if camera_id.trim().is_empty() {
            return Err(CamcastError::Validation("missing camera_id".to_string()));
        }
        Ok(CameraId(camera_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_parse_as_non_negative_millis() {
        assert_eq!(parse_timestamp("1709251200000").unwrap(), 1_709_251_200_000);
        assert_eq!(parse_timestamp(" 0 ").unwrap(), 0);
        assert!(matches!(
            parse_timestamp("-1"),
            Err(CamcastError::Validation(_))
        ));
        assert!(matches!(
            parse_timestamp("2024-03-01T08:00:00"),
            Err(CamcastError::Validation(_))
        ));
        assert!(matches!(parse_timestamp(""), Err(CamcastError::Validation(_))));
    }

    #[test]
    fn timestamps_beyond_chrono_range_are_rejected() {
        assert!(matches!(
            parse_timestamp(&i64::MAX.to_string()),
            Err(CamcastError::Validation(_))
        ));
        let max = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        assert_eq!(parse_timestamp(&max.to_string()).unwrap(), max);
        assert!(parse_timestamp(&(max + 1).to_string()).is_err());
    }
}
