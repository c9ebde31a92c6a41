//! Vessel report and WebSocket message models.
//!
//! Rust field names describe the domain; serde renames keep the JSON keys that
//! producers and dashboards already speak (`ship_id`, `gps_data`, `gps`, ...).

use serde::{Deserialize, Serialize};

/// One positioning-sensor reading inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Sensor name, e.g. `top_gps`.
    #[serde(rename = "gps")]
    pub source_label: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Ground speed as reported by the sensor.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(rename = "satellites", default)]
    pub satellite_count: Option<u32>,
    #[serde(rename = "satellite_prns", default)]
    pub satellite_ids: Vec<String>,
}

impl GpsFix {
    /// Fix with only the required fields set.
    pub fn new(source_label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            source_label: source_label.into(),
            latitude,
            longitude,
            altitude: None,
            speed: None,
            satellite_count: None,
            satellite_ids: Vec::new(),
        }
    }
}

/// Last known state of one vessel, replaced wholesale on every accepted update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    /// ISO-8601 time of the report.
    pub timestamp: String,
    #[serde(rename = "ship_id")]
    pub vessel_id: String,
    pub device_id: Option<String>,
    /// Degrees.
    pub heading: Option<f64>,
    #[serde(rename = "gps_data")]
    pub fixes: Vec<GpsFix>,
}

/// Inbound update as sent by a producer.
///
/// The relay validates raw JSON leniently and does not require this exact shape;
/// the type exists for producers written in Rust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselUpdate {
    pub ship_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    pub gps_data: Vec<GpsFix>,
}

/// Sent once to each accepted connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub r#type: String,
    pub message: String,
    #[serde(rename = "clientCount")]
    pub client_count: usize,
}

impl WelcomeMessage {
    pub fn new(message: impl Into<String>, client_count: usize) -> Self {
        Self {
            r#type: ws_types::WELCOME.to_string(),
            message: message.into(),
            client_count,
        }
    }
}

/// Periodic snapshot broadcast to every connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipsUpdate {
    pub r#type: String,
    /// Sorted by `ship_id`, ascending.
    pub ships: Vec<VesselReport>,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl ShipsUpdate {
    pub fn new(ships: Vec<VesselReport>, timestamp: i64) -> Self {
        Self {
            r#type: ws_types::SHIPS_UPDATE.to_string(),
            ships,
            timestamp,
        }
    }
}

/// One line of the append-only snapshot log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub ships: Vec<VesselReport>,
    pub timestamp: i64,
}

/// WebSocket message types.
pub mod ws_types {
    pub const WELCOME: &str = "welcome";
    pub const SHIPS_UPDATE: &str = "shipsUpdate";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(id: &str) -> VesselReport {
        VesselReport {
            timestamp: "2025-01-01T00:00:00.000Z".to_string(),
            vessel_id: id.to_string(),
            device_id: None,
            heading: None,
            fixes: vec![GpsFix::new("top_gps", 16.8, 96.19)],
        }
    }

    #[test]
    fn report_uses_producer_field_names() {
        let value = serde_json::to_value(report("SHIP1")).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": "2025-01-01T00:00:00.000Z",
                "ship_id": "SHIP1",
                "device_id": null,
                "heading": null,
                "gps_data": [{
                    "gps": "top_gps",
                    "latitude": 16.8,
                    "longitude": 96.19,
                    "altitude": null,
                    "speed": null,
                    "satellites": null,
                    "satellite_prns": []
                }]
            })
        );
    }

    #[test]
    fn report_fields_serialize_in_wire_order() {
        let json = serde_json::to_string(&report("SHIP1")).unwrap();
        let ts = json.find("\"timestamp\"").unwrap();
        let id = json.find("\"ship_id\"").unwrap();
        let gps = json.find("\"gps_data\"").unwrap();
        assert!(ts < id && id < gps);
    }

    #[test]
    fn welcome_uses_camel_case_count() {
        let value = serde_json::to_value(WelcomeMessage::new("hi", 3)).unwrap();
        assert_eq!(
            value,
            json!({"type": "welcome", "message": "hi", "clientCount": 3})
        );
    }

    #[test]
    fn ships_update_envelope_shape() {
        let value = serde_json::to_value(ShipsUpdate::new(vec![], 1_700_000_000_000)).unwrap();
        assert_eq!(
            value,
            json!({"type": "shipsUpdate", "ships": [], "timestamp": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn update_omits_absent_optionals() {
        let update = VesselUpdate {
            ship_id: "SHIP2".to_string(),
            device_id: None,
            timestamp: None,
            heading: Some(90.0),
            gps_data: vec![GpsFix::new("bottom_gps", 1.0, 2.0)],
        };
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("device_id").is_none());
        assert!(value.get("timestamp").is_none());
        assert_eq!(value["heading"], json!(90.0));
    }

    #[test]
    fn fix_defaults_missing_optionals() {
        let fix: GpsFix =
            serde_json::from_value(json!({"gps": "x", "latitude": 1.5, "longitude": 2.5}))
                .unwrap();
        assert_eq!(fix, GpsFix::new("x", 1.5, 2.5));
    }
}
