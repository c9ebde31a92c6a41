//! Wire types shared by the vessel relay and the clients that talk to it.

mod models;

// Explicit re-exports (avoids rust-analyzer issues with `pub use models::*`)
pub use models::ws_types;
pub use models::{GpsFix, ShipsUpdate, SnapshotRecord, VesselReport, VesselUpdate, WelcomeMessage};
