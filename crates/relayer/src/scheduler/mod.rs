//! Periodic snapshot: read the store, broadcast, persist.

use std::sync::Arc;
use std::time::Duration;

use shared::{ShipsUpdate, SnapshotRecord, VesselReport};
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::registry::ConnectionRegistry;
use crate::snapshot_log::AppendLog;
use crate::store::VesselStateStore;

/// Immutable point-in-time view of every known vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ships: Vec<VesselReport>,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Snapshot {
    pub fn envelope(&self) -> ShipsUpdate {
        ShipsUpdate::new(self.ships.clone(), self.timestamp)
    }

    pub fn record(&self) -> SnapshotRecord {
        SnapshotRecord {
            ships: self.ships.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// What one tick did.
#[derive(Debug)]
pub struct TickReport {
    pub snapshot: Snapshot,
    pub delivered: usize,
    pub dropped_clients: usize,
    pub persisted: bool,
}

pub struct SnapshotScheduler {
    store: Arc<VesselStateStore>,
    registry: Arc<ConnectionRegistry>,
    log: AppendLog,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl SnapshotScheduler {
    pub fn new(
        store: Arc<VesselStateStore>,
        registry: Arc<ConnectionRegistry>,
        log: AppendLog,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            log,
            clock,
            period,
        }
    }

    /// Tick forever, every `period` from the moment this is first polled.
    ///
    /// Missed ticks are caught up in a burst so the cadence stays anchored to the
    /// start instant instead of drifting.
    pub async fn run(self) {
        let start = Instant::now() + self.period;
        let mut interval = tokio::time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        tracing::info!(period_ms = self.period.as_millis() as u64, "snapshot scheduler started");
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    /// One snapshot: broadcast always, persist only when at least one vessel is known.
    pub fn tick(&self) -> TickReport {
        let snapshot = Snapshot {
            ships: self.store.snapshot_all(),
            timestamp: self.clock.now_millis(),
        };

        let (delivered, dropped_clients) = match serde_json::to_string(&snapshot.envelope()) {
            Ok(payload) => {
                let outcome = self.registry.broadcast(&payload);
                (outcome.delivered, outcome.removed.len())
            }
            Err(e) => {
                tracing::error!("serialize shipsUpdate failed: {}", e);
                (0, 0)
            }
        };

        let persisted = if snapshot.ships.is_empty() {
            tracing::debug!("no ship data, skipping snapshot log");
            false
        } else {
            self.log.append(&snapshot.record());
            true
        };

        TickReport {
            snapshot,
            delivered,
            dropped_clients,
            persisted,
        }
    }
}
