//! Configuration for the relayer.

use std::path::PathBuf;
use std::time::Duration;

/// Relayer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_clients: usize,
    pub broadcast_interval: Duration,
    pub ships_log_path: PathBuf,
    /// URL quoted in the welcome message.
    pub public_ws_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4001".to_string())
            .parse()
            .unwrap_or(4001);
        let max_clients: usize = std::env::var("MAX_CLIENTS")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .unwrap_or(200);
        let interval_ms: u64 = std::env::var("BROADCAST_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(1000);
        let ships_log_path = std::env::var("SHIPS_LOG_PATH")
            .map(|s| PathBuf::from(shellexpand::tilde(&s).to_string()))
            .unwrap_or_else(|_| PathBuf::from("./ships_log.jsonl"));
        let public_ws_url = std::env::var("PUBLIC_WS_URL")
            .unwrap_or_else(|_| format!("ws://localhost:{}", port));

        Self {
            host,
            port,
            max_clients,
            broadcast_interval: Duration::from_millis(interval_ms),
            ships_log_path,
            public_ws_url,
        }
    }

    /// Loopback config with a short tick, for tests.
    pub fn for_test(ships_log_path: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_clients: 200,
            broadcast_interval: Duration::from_millis(50),
            ships_log_path,
            public_ws_url: "ws://localhost:0".to_string(),
        }
    }

    pub fn welcome_message(&self) -> String {
        format!("Connected to WebSocket server at {}", self.public_ws_url)
    }
}
