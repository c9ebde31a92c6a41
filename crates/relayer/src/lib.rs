//! Vessel position relay: ingest, last-known state, periodic snapshot broadcast.

pub mod api;
pub mod clock;
pub mod config;
pub mod ingest;
pub mod registry;
pub mod scheduler;
pub mod snapshot_log;
pub mod store;
