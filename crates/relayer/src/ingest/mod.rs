//! Validation of inbound vessel updates.
//!
//! Producers send loosely typed JSON. Each message is checked independently:
//! a rejected message is logged and dropped, the connection stays open, and the
//! store is left untouched for that vessel.

use serde_json::{Map, Value};
use shared::{GpsFix, VesselReport};

use crate::clock::Clock;
use crate::store::VesselStateStore;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("invalid message structure: {0}")]
    InvalidStructure(&'static str),
    #[error("no valid GPS entries for {vessel_id}")]
    NoValidFixes { vessel_id: String },
}

/// Parse and sanitize one raw message into a report.
pub fn validate(raw: &str, clock: &dyn Clock) -> Result<VesselReport, IngestError> {
    let value: Value = serde_json::from_str(raw)?;
    let msg = value
        .as_object()
        .ok_or(IngestError::InvalidStructure("payload is not an object"))?;

    let vessel_id = non_empty_str(msg, "ship_id")
        .ok_or(IngestError::InvalidStructure("missing ship_id"))?;
    let entries = match msg.get("gps_data") {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(IngestError::InvalidStructure("missing gps_data")),
    };

    let fixes: Vec<GpsFix> = entries.iter().filter_map(parse_fix).collect();
    if fixes.is_empty() {
        return Err(IngestError::NoValidFixes {
            vessel_id: vessel_id.to_string(),
        });
    }

    Ok(VesselReport {
        timestamp: non_empty_str(msg, "timestamp")
            .map(String::from)
            .unwrap_or_else(|| clock.now_iso8601()),
        vessel_id: vessel_id.to_string(),
        device_id: non_empty_str(msg, "device_id").map(String::from),
        heading: msg.get("heading").and_then(Value::as_f64),
        fixes,
    })
}

/// Validate `raw` and upsert the result. Rejections are logged, never raised.
pub fn ingest(raw: &str, store: &VesselStateStore, clock: &dyn Clock) -> Option<String> {
    match validate(raw, clock) {
        Ok(report) => {
            let vessel_id = report.vessel_id.clone();
            tracing::debug!(
                vessel = %vessel_id,
                fixes = report.fixes.len(),
                "update accepted"
            );
            store.upsert(report);
            Some(vessel_id)
        }
        Err(e) => {
            tracing::warn!("rejected update: {}", e);
            None
        }
    }
}

/// A fix needs a source label and numeric coordinates; everything else is optional.
fn parse_fix(entry: &Value) -> Option<GpsFix> {
    let entry = entry.as_object()?;
    let source_label = non_empty_str(entry, "gps")?;
    let latitude = entry.get("latitude").and_then(Value::as_f64)?;
    let longitude = entry.get("longitude").and_then(Value::as_f64)?;

    Some(GpsFix {
        source_label: source_label.to_string(),
        latitude,
        longitude,
        altitude: entry.get("altitude").and_then(Value::as_f64),
        speed: entry.get("speed").and_then(Value::as_f64),
        satellite_count: entry
            .get("satellites")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        satellite_ids: match entry.get("satellite_prns") {
            Some(Value::Array(prns)) => prns
                .iter()
                .filter_map(|p| p.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        },
    })
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn clock() -> ManualClock {
        ManualClock::from_millis(1_704_067_200_000)
    }

    #[test]
    fn minimal_update_gets_defaults() {
        let raw = json!({
            "ship_id": "SHIP1",
            "gps_data": [{"gps": "top_gps", "latitude": 16.8, "longitude": 96.19}]
        })
        .to_string();
        let report = validate(&raw, &clock()).unwrap();

        assert_eq!(report.vessel_id, "SHIP1");
        assert_eq!(report.timestamp, "2024-01-01T00:00:00.000Z");
        assert_eq!(report.device_id, None);
        assert_eq!(report.heading, None);
        assert_eq!(report.fixes, vec![GpsFix::new("top_gps", 16.8, 96.19)]);
    }

    #[test]
    fn full_update_is_kept() {
        let raw = json!({
            "ship_id": "SHIP2",
            "device_id": "rpi-7",
            "timestamp": "2025-03-01T10:00:00Z",
            "heading": 271.5,
            "gps_data": [{
                "gps": "bottom_gps", "latitude": 16.81, "longitude": 96.2,
                "altitude": 12.5, "speed": 8.0, "satellites": 9,
                "satellite_prns": ["G01", "G12"]
            }]
        })
        .to_string();
        let report = validate(&raw, &clock()).unwrap();

        assert_eq!(report.device_id.as_deref(), Some("rpi-7"));
        assert_eq!(report.timestamp, "2025-03-01T10:00:00Z");
        assert_eq!(report.heading, Some(271.5));
        let fix = &report.fixes[0];
        assert_eq!(fix.altitude, Some(12.5));
        assert_eq!(fix.speed, Some(8.0));
        assert_eq!(fix.satellite_count, Some(9));
        assert_eq!(fix.satellite_ids, vec!["G01", "G12"]);
    }

    #[test]
    fn invalid_fixes_are_filtered() {
        let raw = json!({
            "ship_id": "SHIP3",
            "gps_data": [
                {"gps": "a", "latitude": "16.8", "longitude": 96.1},
                {"latitude": 16.8, "longitude": 96.1},
                {"gps": "", "latitude": 16.8, "longitude": 96.1},
                {"gps": "b", "latitude": 1.0, "longitude": 2.0},
                "not an object"
            ]
        })
        .to_string();
        let report = validate(&raw, &clock()).unwrap();
        assert_eq!(report.fixes, vec![GpsFix::new("b", 1.0, 2.0)]);
    }

    #[test]
    fn missing_coordinates_rejects_whole_message() {
        let store = VesselStateStore::new();
        let raw = json!({"ship_id": "SHIP1", "gps_data": [{"gps": "x"}]}).to_string();

        let err = validate(&raw, &clock()).unwrap_err();
        assert!(matches!(err, IngestError::NoValidFixes { ref vessel_id } if vessel_id == "SHIP1"));
        assert_eq!(ingest(&raw, &store, &clock()), None);
        assert!(store.is_empty());
    }

    #[test]
    fn rejected_update_keeps_previous_report() {
        let store = VesselStateStore::new();
        let good = json!({
            "ship_id": "SHIP1",
            "gps_data": [{"gps": "top_gps", "latitude": 1.0, "longitude": 2.0}]
        })
        .to_string();
        let bad = json!({"ship_id": "SHIP1", "gps_data": [{"gps": "top_gps"}]}).to_string();

        assert_eq!(ingest(&good, &store, &clock()).as_deref(), Some("SHIP1"));
        assert_eq!(ingest(&bad, &store, &clock()), None);
        assert_eq!(store.get("SHIP1").unwrap().fixes[0].latitude, 1.0);
    }

    #[test]
    fn structural_rejections() {
        let c = clock();
        assert!(matches!(
            validate("{not json", &c),
            Err(IngestError::MalformedPayload(_))
        ));
        for raw in [
            json!([1, 2]),
            json!({"gps_data": [{"gps": "a", "latitude": 1.0, "longitude": 1.0}]}),
            json!({"ship_id": "", "gps_data": [{"gps": "a", "latitude": 1.0, "longitude": 1.0}]}),
            json!({"ship_id": 7, "gps_data": [{"gps": "a", "latitude": 1.0, "longitude": 1.0}]}),
            json!({"ship_id": "S"}),
            json!({"ship_id": "S", "gps_data": []}),
            json!({"ship_id": "S", "gps_data": "top_gps"}),
        ] {
            assert!(
                matches!(
                    validate(&raw.to_string(), &c),
                    Err(IngestError::InvalidStructure(_))
                ),
                "expected InvalidStructure for {}",
                raw
            );
        }
    }

    #[test]
    fn non_numeric_heading_becomes_null() {
        let raw = json!({
            "ship_id": "SHIP4",
            "heading": "north",
            "device_id": 12,
            "gps_data": [{"gps": "a", "latitude": 1.0, "longitude": 1.0,
                          "altitude": "high", "satellites": -3,
                          "satellite_prns": ["G01", 5, null]}]
        })
        .to_string();
        let report = validate(&raw, &clock()).unwrap();
        assert_eq!(report.heading, None);
        assert_eq!(report.device_id, None);
        assert_eq!(report.fixes[0].altitude, None);
        assert_eq!(report.fixes[0].satellite_count, None);
        assert_eq!(report.fixes[0].satellite_ids, vec!["G01"]);
    }
}
