//! Protocol dispatcher
//!
//! Interprets one inbound text frame, routes it to the registry and formats
//! the response envelope. Every failure is recovered into a
//! `success: false` result; nothing here is fatal.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error};

use homewire_core::{ResultEnvelope, SyncError};

use crate::registry::AccessoryRegistry;

/// Routes client messages to registry operations.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<AccessoryRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<AccessoryRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one raw text frame and produce the response envelope for the
    /// originating connection.
    pub fn dispatch(&self, raw: &str) -> ResultEnvelope {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => return self.failure(None, SyncError::NotJson { raw: raw.to_string() }),
        };
        debug!(message = %value, "Message received");

        // Salvage the correlation id even when the envelope is incomplete
        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        let response = self.route(&value, id);
        debug!(response = ?response, "Response prepared");
        response
    }

    fn route(&self, value: &Value, id: Option<Value>) -> ResultEnvelope {
        let topic = value
            .get("topic")
            .and_then(Value::as_str)
            .filter(|topic| !topic.is_empty());
        let payload = value.get("payload").filter(|payload| !payload.is_null());
        let id_present = match &id {
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        };

        let (Some(topic), Some(payload), true) = (topic, payload, id_present) else {
            return self.failure(id, SyncError::MissingFields);
        };

        match topic {
            "add" => match payload {
                Value::Array(items) => self.add_many(items, id),
                _ => match self.registry.add_value(payload) {
                    Ok(outcome) => ResultEnvelope::ok(id, outcome.message, Some(outcome.payload)),
                    Err(err) => self.failure(id, err),
                },
            },
            "del" => {
                let raw_id = payload.get("id").cloned().unwrap_or(Value::Null);
                ResultEnvelope::ok(id, self.registry.delete(&raw_id), None)
            }
            "set" => {
                let raw_id = payload.get("id").cloned().unwrap_or(Value::Null);
                let empty = Map::new();
                let characteristics = payload
                    .get("characteristics")
                    .and_then(Value::as_object)
                    .unwrap_or(&empty);
                match self.registry.set_characteristics(&raw_id, characteristics) {
                    Ok(message) => ResultEnvelope::ok(id, message, None),
                    Err(err) => self.failure(id, err),
                }
            }
            "get" => {
                let raw_id = payload.get("id").cloned().unwrap_or(Value::Null);
                match self.registry.get(&raw_id) {
                    Ok((message, records)) => ResultEnvelope::ok(id, message, Some(records)),
                    Err(err) => self.failure(id, err),
                }
            }
            _ => self.failure(id, SyncError::UnsupportedTopic),
        }
    }

    /// Apply `add` to each element independently; one bad element does not
    /// abort the rest. The summary payload carries the per-element results.
    fn add_many(&self, items: &[Value], id: Option<Value>) -> ResultEnvelope {
        let mut results = Vec::with_capacity(items.len());
        let mut succeeded = 0usize;
        let mut rejected = 0usize;
        for item in items {
            let result = match self.registry.add_value(item) {
                Ok(outcome) => {
                    succeeded += 1;
                    ResultEnvelope::ok(id.clone(), outcome.message, Some(outcome.payload))
                }
                Err(err) => {
                    rejected += 1;
                    self.failure(id.clone(), err)
                }
            };
            results.push(serde_json::to_value(result).unwrap_or(Value::Null));
        }
        ResultEnvelope::ok(
            id,
            format!("Multiple Accessories Added - {succeeded} Successful, {rejected} Rejected"),
            Some(Value::Array(results)),
        )
    }

    fn failure(&self, id: Option<Value>, err: SyncError) -> ResultEnvelope {
        error!(%err, "Request failed");
        ResultEnvelope::err(id, &err)
    }
}
