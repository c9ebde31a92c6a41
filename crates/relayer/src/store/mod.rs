//! Last-known report per vessel.

use std::collections::BTreeMap;
use std::sync::RwLock;

use shared::VesselReport;

/// Mapping from `vessel_id` to its latest accepted report.
///
/// Entries are never removed: a vessel that stops reporting stays at its last
/// position for the lifetime of the process. Keys live in a `BTreeMap`, so
/// [`snapshot_all`](Self::snapshot_all) comes out in ascending byte order.
#[derive(Debug, Default)]
pub struct VesselStateStore {
    reports: RwLock<BTreeMap<String, VesselReport>>,
}

impl VesselStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing entry for `report.vessel_id`. No merge of fixes.
    pub fn upsert(&self, report: VesselReport) {
        let mut reports = self.reports.write().unwrap_or_else(|e| e.into_inner());
        reports.insert(report.vessel_id.clone(), report);
    }

    /// Owned copy of every report, sorted by `vessel_id`.
    pub fn snapshot_all(&self) -> Vec<VesselReport> {
        let reports = self.reports.read().unwrap_or_else(|e| e.into_inner());
        reports.values().cloned().collect()
    }

    pub fn get(&self, vessel_id: &str) -> Option<VesselReport> {
        let reports = self.reports.read().unwrap_or_else(|e| e.into_inner());
        reports.get(vessel_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
