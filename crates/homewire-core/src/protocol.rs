//! Wire protocol envelopes
//!
//! Remote clients send `{topic, payload, id}` requests and receive a
//! `{id, topic: "result", message, payload, success}` envelope in reply.
//! Independently of request traffic the core pushes unsolicited
//! [`PushMessage`]s to every connected client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::DeviceRecord;
use crate::error::SyncError;

/// Topic of every response envelope.
pub const RESULT_TOPIC: &str = "result";

/// Response to a single client request.
///
/// `id` echoes the client's correlation id verbatim; both `id` and `payload`
/// are omitted from the JSON entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub topic: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub success: bool,
}

impl ResultEnvelope {
    /// Successful outcome.
    pub fn ok(id: Option<Value>, message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            id,
            topic: RESULT_TOPIC.to_string(),
            message: message.into(),
            payload,
            success: true,
        }
    }

    /// Recovered error outcome.
    pub fn err(id: Option<Value>, error: &SyncError) -> Self {
        Self {
            id,
            topic: RESULT_TOPIC.to_string(),
            message: error.to_string(),
            payload: None,
            success: false,
        }
    }
}

/// Unsolicited message fanned out to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "lowercase")]
pub enum PushMessage {
    /// A controller wrote a characteristic; carries the full updated record.
    Set(DeviceRecord),
    /// A controller read a characteristic; asks clients to push a fresher
    /// value for the given device id.
    Get(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let envelope = ResultEnvelope::err(None, &SyncError::MissingFields);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({
                "topic": "result",
                "message": "Message Must Contain A Topic, Payload & Id",
                "success": false
            })
        );
    }

    #[test]
    fn test_envelope_echoes_correlation_id() {
        let envelope = ResultEnvelope::ok(Some(json!("req-7")), "All Accessories Deleted", None);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["id"], json!("req-7"));
        assert_eq!(json["success"], json!(true));
    }

    #[test]
    fn test_push_set_shape() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 1,
            "name": "Lamp",
            "service": "Lightbulb",
            "characteristics": {"On": true}
        }))
        .unwrap();
        let json = serde_json::to_value(PushMessage::Set(record)).unwrap();
        assert_eq!(json["topic"], json!("set"));
        assert_eq!(json["payload"]["characteristics"]["On"], json!(true));
    }

    #[test]
    fn test_push_get_carries_raw_id() {
        let json = serde_json::to_value(PushMessage::Get(json!(1))).unwrap();
        assert_eq!(json, json!({"topic": "get", "payload": 1}));
    }
}
