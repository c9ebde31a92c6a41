//! Vessel position relay: WebSocket ingest and periodic snapshot broadcast.
//!
//! Optional env: HOST, PORT, MAX_CLIENTS, BROADCAST_INTERVAL_MS, SHIPS_LOG_PATH, PUBLIC_WS_URL

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use relayer::{api, clock, config, scheduler, snapshot_log};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(config::Config::from_env());

    let (log, log_writer) = snapshot_log::AppendLog::spawn(&config.ships_log_path);
    let state = api::AppState::new(config.clone(), Arc::new(clock::SystemClock));

    let scheduler = scheduler::SnapshotScheduler::new(
        state.store.clone(),
        state.registry.clone(),
        log,
        state.clock.clone(),
        config.broadcast_interval,
    );
    let ticker = tokio::spawn(scheduler.run());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    tracing::info!(
        "Relayer listening on {} (max clients {}, snapshot log {})",
        listener.local_addr()?,
        config.max_clients,
        config.ships_log_path.display()
    );

    tokio::select! {
        res = api::serve(listener, state) => res?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    // Aborting the ticker drops the scheduler's AppendLog, which ends the writer task.
    ticker.abort();
    let _ = ticker.await;
    let _ = log_writer.await;

    Ok(())
}
