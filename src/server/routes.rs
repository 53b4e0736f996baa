//! Route table

use axum::routing::{get, post};
use axum::Router;

use super::connection::ServerState;
use super::{http, ws};

/// Build the relay's HTTP and WebSocket router
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/ws/driver/{driver_id}", get(ws::driver_upgrade))
        .route("/ws/monitor", get(ws::monitor_upgrade))
        .route("/location", post(http::post_location))
        .route("/locations", get(http::get_locations))
        .route("/locations/{driver_id}", get(http::get_location))
        .route("/stats", get(http::stats))
        .route("/healthz", get(http::healthz))
        .with_state(state)
}
