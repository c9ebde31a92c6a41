//! Connection registry: admission ceiling, welcome, and fan-out.

use std::collections::HashMap;
use std::sync::RwLock;

use shared::WelcomeMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identity of a registered connection.
pub type ConnectionId = Uuid;

/// Outbound queue of one connection. The socket writer task owns the receiving end.
pub type Outbound = mpsc::UnboundedSender<String>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("maximum clients reached ({max})")]
    CapacityExceeded { max: usize },
}

/// Result of a successful registration.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub id: ConnectionId,
    /// Active connections including this one.
    pub client_count: usize,
}

/// Result of one [`ConnectionRegistry::broadcast`].
#[derive(Debug, Default)]
pub struct BroadcastOutcome {
    pub delivered: usize,
    /// Connections whose queue was closed; already unregistered.
    pub removed: Vec<ConnectionId>,
}

/// Active subscriber connections.
pub struct ConnectionRegistry {
    max_clients: usize,
    welcome: String,
    connections: RwLock<HashMap<ConnectionId, Outbound>>,
}

impl ConnectionRegistry {
    pub fn new(max_clients: usize, welcome: impl Into<String>) -> Self {
        Self {
            max_clients,
            welcome: welcome.into(),
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Admit `outbound` if below the ceiling and queue the welcome message on it.
    pub fn register(&self, outbound: Outbound) -> Result<Registration, RegistryError> {
        let mut connections = self.connections.write().unwrap_or_else(|e| e.into_inner());
        if connections.len() >= self.max_clients {
            return Err(RegistryError::CapacityExceeded {
                max: self.max_clients,
            });
        }
        let id = Uuid::new_v4();
        let client_count = connections.len() + 1;
        let welcome = WelcomeMessage::new(self.welcome.clone(), client_count);
        if let Ok(json) = serde_json::to_string(&welcome) {
            // Queued before the first broadcast can reach this sender.
            let _ = outbound.send(json);
        }
        connections.insert(id, outbound);
        tracing::info!(%id, clients = client_count, "client connected");
        Ok(Registration { id, client_count })
    }

    /// Idempotent. Returns whether the connection was still registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().unwrap_or_else(|e| e.into_inner());
        let removed = connections.remove(&id).is_some();
        if removed {
            tracing::info!(%id, clients = connections.len(), "client disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue `payload` on every open connection.
    ///
    /// Sends never block. A connection whose queue is closed is removed without
    /// affecting delivery to the others.
    pub fn broadcast(&self, payload: &str) -> BroadcastOutcome {
        let targets: Vec<(ConnectionId, Outbound)> = {
            let connections = self.connections.read().unwrap_or_else(|e| e.into_inner());
            connections
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut outcome = BroadcastOutcome::default();
        for (id, tx) in targets {
            if tx.send(payload.to_owned()).is_ok() {
                outcome.delivered += 1;
            } else {
                tracing::warn!(%id, "send failed, dropping client");
                self.unregister(id);
                outcome.removed.push(id);
            }
        }
        outcome
    }
}
