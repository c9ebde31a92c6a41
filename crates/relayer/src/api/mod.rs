//! HTTP + WebSocket surface.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::clock::Clock;
use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::store::VesselStateStore;

/// Shared relay state: one instance per process, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub store: Arc<VesselStateStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        let registry = ConnectionRegistry::new(config.max_clients, config.welcome_message());
        Self {
            registry: Arc::new(registry),
            store: Arc::new(VesselStateStore::new()),
            clock,
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::ws_handler))
        .route("/ws", get(routes::ws_handler))
        .route("/health", get(health))
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state)
}

/// Serve `router(state)` on `listener` until the server stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn health() -> &'static str {
    "ok"
}
