use crate::error::CamcastError;
use crate::server::router::CamcastState;
use axum::{Json, Router, extract::State, routing::get};
use camcast_schema::RecentLookup;

pub fn router() -> Router<CamcastState> {
    Router::new().route("/reports/recent", get(recent_reports_handler))
}

pub async fn recent_reports_handler(
    State(state): State<CamcastState>,
) -> Result<Json<Vec<RecentLookup>>, CamcastError> {
    let rows = state.reports.recent(state.recent_limit).await?;
    Ok(Json(rows))
}
