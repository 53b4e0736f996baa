//! WebSocket routes
//!
//! Each socket is split: a writer task drains the connection's outbound
//! queue while the handler task reads frames. Driver frames are ingested;
//! monitor frames are scanned for `subscribe:` directives.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::OwnedSemaphorePermit;

use crate::protocol::MonitorCommand;
use crate::registry::ConnectionHandle;
use crate::session::{LocationHub, SessionState, Subscription};

use super::connection::{writer_task, ServerState};
use super::http::error_response;

/// Query parameters for monitor connections
#[derive(Debug, Default, Deserialize)]
pub struct MonitorQuery {
    /// Only receive updates for this driver
    #[serde(default)]
    pub filter_driver: Option<String>,
}

/// GET /ws/driver/{driver_id}
pub async fn driver_upgrade(
    State(state): State<ServerState>,
    Path(driver_id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if driver_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing driver_id");
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let permit = match admit(&state) {
        Ok(permit) => permit,
        Err(response) => return response,
    };

    ws.on_upgrade(move |socket| async move {
        run_driver(socket, state, driver_id).await;
        drop(permit);
    })
}

/// GET /ws/monitor?filter_driver=<id>
pub async fn monitor_upgrade(
    State(state): State<ServerState>,
    Query(query): Query<MonitorQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let permit = match admit(&state) {
        Ok(permit) => permit,
        Err(response) => return response,
    };

    let subscription = Subscription::from_filter(query.filter_driver.as_deref().unwrap_or(""));

    ws.on_upgrade(move |socket| async move {
        run_monitor(socket, state, subscription).await;
        drop(permit);
    })
}

fn admit(state: &ServerState) -> Result<Option<OwnedSemaphorePermit>, Response> {
    state.try_admit().map_err(|_| {
        tracing::warn!("Connection rejected: limit reached");
        error_response(StatusCode::SERVICE_UNAVAILABLE, "too many connections")
    })
}

async fn run_driver(socket: WebSocket, state: ServerState, driver_id: String) {
    let hub = state.hub;
    let (conn, outbound) = hub.open_producer(&driver_id, state.outbound_buffer).await;
    let mut session = SessionState::driver(conn.id(), driver_id.as_str());
    session.activate();

    tracing::info!(driver_id = %driver_id, connection_id = %conn.id(), "Driver connected");

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(writer_task(
        conn.id(),
        sink,
        outbound,
        conn.token(),
        hub.write_timeout(),
    ));

    loop {
        let frame = tokio::select! {
            _ = conn.closed() => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                ingest(&hub, &mut session, &driver_id, text.as_bytes()).await;
            }
            Some(Ok(Message::Binary(data))) => {
                ingest(&hub, &mut session, &driver_id, &data).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(driver_id = %driver_id, error = %e, "Driver read error");
                break;
            }
        }
    }

    session.close();
    hub.close_producer(&driver_id, conn.id()).await;
    conn.close();
    let _ = writer.await;
    session.finish();

    tracing::info!(
        driver_id = %driver_id,
        connection_id = %conn.id(),
        frames = session.frames_received,
        rejected = session.frames_rejected,
        duration_ms = session.duration().as_millis() as u64,
        "Driver disconnected"
    );
}

async fn ingest(hub: &LocationHub, session: &mut SessionState, driver_id: &str, payload: &[u8]) {
    match hub.ingest_frame(driver_id, payload).await {
        Ok(_) => session.on_frame(true),
        Err(e) => {
            session.on_frame(false);
            tracing::warn!(driver_id = %driver_id, error = %e, "Invalid location frame");
        }
    }
}

async fn run_monitor(socket: WebSocket, state: ServerState, subscription: Subscription) {
    let hub = state.hub;
    let (conn, outbound) = hub.open_monitor(&subscription, state.outbound_buffer).await;
    let mut session = SessionState::monitor(conn.id(), subscription);
    session.activate();

    tracing::info!(connection_id = %conn.id(), filter = %describe(&session), "Monitor connected");

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(writer_task(
        conn.id(),
        sink,
        outbound,
        conn.token(),
        hub.write_timeout(),
    ));

    loop {
        let frame = tokio::select! {
            _ = conn.closed() => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                session.on_frame(true);
                if !handle_directive(&hub, &conn, &mut session, text.as_str()).await {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(connection_id = %conn.id(), error = %e, "Monitor read error");
                break;
            }
        }
    }

    session.close();
    hub.close_monitor(conn.id()).await;
    conn.close();
    let _ = writer.await;
    session.finish();

    tracing::info!(
        connection_id = %conn.id(),
        frames = session.frames_received,
        duration_ms = session.duration().as_millis() as u64,
        "Monitor disconnected"
    );
}

/// Returns false once the monitor has been pruned
async fn handle_directive(
    hub: &LocationHub,
    conn: &ConnectionHandle,
    session: &mut SessionState,
    text: &str,
) -> bool {
    let Some(command) = MonitorCommand::parse(text) else {
        return true;
    };

    session.on_command(&command);
    match &command {
        MonitorCommand::Subscribe(driver_id) => hub.subscribe(conn, driver_id).await,
    }
}

fn describe(session: &SessionState) -> String {
    session
        .subscription()
        .map(ToString::to_string)
        .unwrap_or_default()
}
