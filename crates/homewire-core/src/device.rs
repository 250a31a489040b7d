//! Device records as submitted by remote clients

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Manufacturer reported to the bridge framework when the record has none.
pub const DEFAULT_MANUFACTURER: &str = "Default-Manufacturer";
/// Model reported to the bridge framework when the record has none.
pub const DEFAULT_MODEL: &str = "Default-Model";
/// Serial number reported to the bridge framework when the record has none.
pub const DEFAULT_SERIAL: &str = "Default-Serial";

/// One accessory as described by a remote client.
///
/// The record is the registry's source of truth for characteristic values.
/// `id` is kept as the raw JSON scalar the client sent (string or number);
/// its canonical string form seeds the derived accessory identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Client-supplied identifier, string or number
    pub id: Value,
    /// Human-readable name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Name of the single capability category (e.g. "Lightbulb")
    pub service: String,
    /// Characteristic name -> current value
    #[serde(default)]
    pub characteristics: Map<String, Value>,
}

impl DeviceRecord {
    /// Canonical string form of the client-supplied id.
    pub fn canonical_id(&self) -> String {
        canonical_id(&self.id)
    }

    /// Manufacturer to report to the bridge framework.
    pub fn manufacturer(&self) -> &str {
        self.manufacturer.as_deref().unwrap_or(DEFAULT_MANUFACTURER)
    }

    /// Model to report to the bridge framework.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Serial number to report to the bridge framework.
    pub fn serial(&self) -> &str {
        self.serial.as_deref().unwrap_or(DEFAULT_SERIAL)
    }
}

/// Canonical string form of a raw client id.
///
/// Strings are used as-is; any other scalar takes its JSON text form, so the
/// number `1` and the string `"1"` name the same accessory.
pub fn canonical_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_id_string_and_number_agree() {
        assert_eq!(canonical_id(&json!(1)), "1");
        assert_eq!(canonical_id(&json!("1")), "1");
        assert_eq!(canonical_id(&json!("lamp")), "lamp");
    }

    #[test]
    fn test_record_round_trips_without_optional_fields() {
        let raw = json!({
            "id": 1,
            "name": "Lamp",
            "service": "Lightbulb",
            "characteristics": {"On": false}
        });
        let record: DeviceRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.name, "Lamp");
        assert_eq!(record.manufacturer(), DEFAULT_MANUFACTURER);
        // Optional fields absent on input stay absent on output
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_record_requires_id() {
        let raw = json!({"name": "Lamp", "service": "Lightbulb"});
        assert!(serde_json::from_value::<DeviceRecord>(raw).is_err());
    }

    #[test]
    fn test_characteristics_default_to_empty() {
        let raw = json!({"id": "x", "name": "X", "service": "Switch"});
        let record: DeviceRecord = serde_json::from_value(raw).unwrap();
        assert!(record.characteristics.is_empty());
    }
}
