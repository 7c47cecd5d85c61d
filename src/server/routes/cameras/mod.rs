use crate::server::router::CamcastState;
use axum::{Router, routing::get};

pub mod extract;
pub mod handlers;

pub fn router() -> Router<CamcastState> {
    Router::new()
        .route("/cameras", get(handlers::cameras_handler))
        .route("/cameras/", get(handlers::cameras_handler))
        .route("/cameras/{camera_id}", get(handlers::camera_details_handler))
}
