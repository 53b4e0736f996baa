//! Plain HTTP routes

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::json;

use super::connection::ServerState;

/// JSON error body `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /location
pub async fn post_location(State(state): State<ServerState>, body: Bytes) -> Response {
    match state.hub.submit(&body).await {
        Ok(outcome) => {
            tracing::trace!(?outcome, "Location submitted over HTTP");
            Json(json!({ "ok": true })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected location submission");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

/// GET /locations
pub async fn get_locations(State(state): State<ServerState>) -> Response {
    let locations = state.hub.all_last_known().await;
    Json(json!({
        "count": locations.len(),
        "locations": locations,
    }))
    .into_response()
}

/// GET /locations/{driver_id}
pub async fn get_location(
    State(state): State<ServerState>,
    Path(driver_id): Path<String>,
) -> Response {
    match state.hub.last_known(&driver_id).await {
        Some(update) => Json(update).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "not found"),
    }
}

/// GET /stats
pub async fn stats(State(state): State<ServerState>) -> Response {
    Json(state.hub.stats().await).into_response()
}

/// GET /healthz
pub async fn healthz() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}
