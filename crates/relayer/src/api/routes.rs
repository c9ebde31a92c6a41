//! API route handlers.

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use shared::VesselReport;
use tokio::sync::mpsc;

use crate::api::AppState;
use crate::ingest;
use crate::registry::RegistryError;

const CAPACITY_CLOSE_REASON: &str = "Maximum clients reached";

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ships", get(ships_list))
        .route("/ships/{ship_id}", get(ships_get))
        .route("/status", get(status))
}

// --- Ships ---

/// Current last-known reports, sorted by ship_id.
async fn ships_list(State(state): State<AppState>) -> Json<Vec<VesselReport>> {
    Json(state.store.snapshot_all())
}

async fn ships_get(
    State(state): State<AppState>,
    Path(ship_id): Path<String>,
) -> Result<Json<VesselReport>, (StatusCode, String)> {
    state
        .store
        .get(&ship_id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "ship not found".to_string()))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    clients: usize,
    max_clients: usize,
    vessels: usize,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        clients: state.registry.len(),
        max_clients: state.registry.max_clients(),
        vessels: state.store.len(),
    })
}

// --- WebSocket ---

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Register the connection, then run a writer (registry queue → socket) and a
/// reader (socket → ingest) until either side ends. The connection is
/// unregistered on every exit path.
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let id = match state.registry.register(tx) {
        Ok(registration) => registration.id,
        Err(RegistryError::CapacityExceeded { max }) => {
            tracing::warn!(%peer, max, "max clients reached, rejecting new connection");
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: CAPACITY_CLOSE_REASON.into(),
                })))
                .await;
            return;
        }
    };
    tracing::debug!(%peer, %id, "websocket registered");

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                tracing::warn!(%id, "websocket send failed: {}", e);
                break;
            }
        }
    });

    let store = state.store.clone();
    let clock = state.clock.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    ingest::ingest(text.as_str(), &store, clock.as_ref());
                }
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        ingest::ingest(text, &store, clock.as_ref());
                    }
                    Err(e) => tracing::warn!(%id, "rejected binary frame: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(%id, "websocket error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    state.registry.unregister(id);
}
