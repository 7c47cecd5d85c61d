use super::extract::{CameraId, SnapshotTimestamp};
use crate::error::CamcastError;
use crate::reports::details_params;
use crate::server::client::ClientFingerprint;
use crate::server::router::CamcastState;
use axum::{Json, extract::State, http::Uri};
use camcast_schema::{CameraDetailsBody, CameraSnapshotBody};
use serde_json::json;

pub async fn cameras_handler(
    State(state): State<CamcastState>,
    client: ClientFingerprint,
    uri: Uri,
    SnapshotTimestamp(timestamp): SnapshotTimestamp,
) -> Result<Json<Vec<CameraSnapshotBody>>, CamcastError> {
    let cameras = state.coordinator.get_cameras(timestamp).await?;
    let body = cameras.iter().map(|c| c.to_body(&state.clock)).collect();

    state
        .reports
        .record(client.into_inner(), timestamp, uri.path(), json!({}));
    Ok(Json(body))
}

pub async fn camera_details_handler(
    State(state): State<CamcastState>,
    client: ClientFingerprint,
    uri: Uri,
    CameraId(camera_id): CameraId,
    SnapshotTimestamp(timestamp): SnapshotTimestamp,
) -> Result<Json<CameraDetailsBody>, CamcastError> {
    let details = state
        .coordinator
        .get_camera_details(timestamp, &camera_id)
        .await?;

    state.reports.record(
        client.into_inner(),
        timestamp,
        uri.path(),
        details_params(&details),
    );
    Ok(Json(details.to_body(&state.clock)))
}
