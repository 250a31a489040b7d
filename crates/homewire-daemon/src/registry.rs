//! Accessory registry
//!
//! Owns the set of live accessories, keyed by the identifier derived from
//! the client-supplied id. All mutation funnels through here: client `add` /
//! `del` / `set` requests, and cache restoration at startup. The registry is
//! the single source of truth for characteristic values.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use homewire_core::{canonical_id, DeviceRecord, SyncError};
use homewire_hap::{AccessoryDirectory, AccessoryPort, ServiceKind, ServicePort};

use crate::bridge::CharacteristicBridge;
use crate::hub::ClientHub;

/// Result of a successful add: the outcome message plus the `{id, uuid}`
/// payload echoed to the client.
pub struct AddOutcome {
    pub message: String,
    pub payload: Value,
}

struct Accessory {
    record: Arc<RwLock<DeviceRecord>>,
    port: Arc<dyn AccessoryPort>,
    bridge: Arc<CharacteristicBridge>,
}

#[derive(Default)]
struct Table {
    entries: HashMap<Uuid, Accessory>,
    /// Insertion order, the order `get all` reports
    order: Vec<Uuid>,
}

/// The accessory registry.
pub struct AccessoryRegistry {
    directory: Arc<dyn AccessoryDirectory>,
    hub: ClientHub,
    window: Duration,
    table: RwLock<Table>,
}

impl AccessoryRegistry {
    pub fn new(directory: Arc<dyn AccessoryDirectory>, hub: ClientHub, window: Duration) -> Self {
        Self {
            directory,
            hub,
            window,
            table: RwLock::new(Table::default()),
        }
    }

    /// Add a new accessory or replace an existing one. Never fails for a
    /// well-formed record.
    pub fn add(&self, record: DeviceRecord) -> AddOutcome {
        let id = record.canonical_id();
        let uuid = self.directory.derive_uuid(&id);
        let payload = json!({"id": record.id.clone(), "uuid": uuid});

        let mut table = self.table.write();
        if let Some(entry) = table.entries.get_mut(&uuid) {
            debug!(accessory = %id, uuid = %uuid, "Replacing accessory");
            entry.bridge.clear_prompt();
            *entry.record.write() = record.clone();
            entry.port.set_context(&record);
            let bridge =
                CharacteristicBridge::new(entry.record.clone(), self.hub.clone(), self.window);
            bridge.install(&entry.port);
            entry.bridge = bridge;
            self.directory.update(&entry.port);
            AddOutcome {
                message: format!("Accessory {id} Updated With UUID {uuid}"),
                payload,
            }
        } else {
            info!(accessory = %id, uuid = %uuid, name = %record.name, "Adding accessory");
            let port = self.directory.create(&record.name, uuid);
            port.set_context(&record);
            let shared = Arc::new(RwLock::new(record));
            let bridge = CharacteristicBridge::new(shared.clone(), self.hub.clone(), self.window);
            bridge.install(&port);
            self.directory.register(&port);
            table.entries.insert(
                uuid,
                Accessory {
                    record: shared,
                    port,
                    bridge,
                },
            );
            table.order.push(uuid);
            AddOutcome {
                message: format!("Accessory {id} Added With UUID {uuid}"),
                payload,
            }
        }
    }

    /// Deserialize one element of an `add` payload and add it. Elements
    /// that do not describe a device (or whose id is not a scalar) are
    /// rejected without touching the registry.
    pub fn add_value(&self, value: &Value) -> Result<AddOutcome, SyncError> {
        let record: DeviceRecord =
            serde_json::from_value(value.clone()).map_err(|_| SyncError::InvalidDevice)?;
        if !matches!(record.id, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            return Err(SyncError::InvalidDevice);
        }
        Ok(self.add(record))
    }

    /// Remove accessories. The sentinel `"all"` empties the registry;
    /// otherwise every accessory whose record id matches the raw value
    /// (canonical-string equality, so `1` matches `"1"`) is removed.
    /// Deleting a non-existent id reports the same success message.
    pub fn delete(&self, raw_id: &Value) -> String {
        let mut table = self.table.write();
        if raw_id.as_str() == Some("all") {
            let removed: Vec<Uuid> = table.order.drain(..).collect();
            for uuid in removed {
                if let Some(entry) = table.entries.remove(&uuid) {
                    self.directory.unregister(&entry.port);
                }
            }
            info!("All accessories deleted");
            return "All Accessories Deleted".to_string();
        }

        let target = canonical_id(raw_id);
        let Table { entries, order } = &mut *table;
        let matched: Vec<Uuid> = order
            .iter()
            .copied()
            .filter(|uuid| {
                entries
                    .get(uuid)
                    .is_some_and(|entry| entry.record.read().canonical_id() == target)
            })
            .collect();
        order.retain(|uuid| !matched.contains(uuid));
        for uuid in &matched {
            if let Some(entry) = entries.remove(uuid) {
                self.directory.unregister(&entry.port);
            }
        }
        debug!(accessory = %target, removed = matched.len(), "Delete processed");
        format!("Accessory {target} Deleted")
    }

    /// Look up one accessory's record, or every record (in registry order)
    /// for the sentinel `"all"`.
    pub fn get(&self, raw_id: &Value) -> Result<(String, Value), SyncError> {
        let table = self.table.read();
        if raw_id.as_str() == Some("all") {
            let records: Vec<Value> = table
                .order
                .iter()
                .filter_map(|uuid| table.entries.get(uuid))
                .map(|entry| record_json(&entry.record.read()))
                .collect();
            return Ok(("All Accessories".to_string(), Value::Array(records)));
        }

        let id = canonical_id(raw_id);
        let uuid = self.directory.derive_uuid(&id);
        match table.entries.get(&uuid) {
            Some(entry) => Ok((format!("Accessory {id}"), record_json(&entry.record.read()))),
            None => Err(SyncError::AccessoryNotFound { id }),
        }
    }

    /// Overwrite stored characteristic values and push them to the
    /// capability port. The request came from a client, so nothing is
    /// broadcast back; an outstanding read prompt counts as answered.
    pub fn set_characteristics(
        &self,
        raw_id: &Value,
        characteristics: &Map<String, Value>,
    ) -> Result<String, SyncError> {
        let id = canonical_id(raw_id);
        let uuid = self.directory.derive_uuid(&id);
        let table = self.table.read();
        let entry = table
            .entries
            .get(&uuid)
            .ok_or_else(|| SyncError::AccessoryNotFound { id: id.clone() })?;

        entry.bridge.clear_prompt();

        let service_name = entry.record.read().service.clone();
        let kind = ServiceKind::from_name(&service_name)
            .ok_or(SyncError::ServiceNotPresent { service: service_name })?;
        let service = entry.port.service(kind);

        let mut record = entry.record.write();
        for (name, value) in characteristics {
            debug!(accessory = %id, characteristic = %name, value = %value, "Client write");
            record.characteristics.insert(name.clone(), value.clone());
            service.update_characteristic(name, value.clone());
        }
        Ok(format!("{id} Characteristics Updated"))
    }

    /// Framework cache-restore callback: re-attach hooks to a previously
    /// known accessory and take its record into the registry.
    pub fn restore(&self, port: Arc<dyn AccessoryPort>) -> bool {
        let Some(record) = port.context() else {
            warn!(uuid = %port.uuid(), "Cached accessory has no device record, skipped");
            return false;
        };
        info!(accessory = %record.canonical_id(), name = %record.name, "Restoring accessory from cache");

        let uuid = port.uuid();
        let shared = Arc::new(RwLock::new(record));
        let bridge = CharacteristicBridge::new(shared.clone(), self.hub.clone(), self.window);
        bridge.install(&port);
        self.directory.update(&port);

        let mut table = self.table.write();
        if !table.entries.contains_key(&uuid) {
            table.order.push(uuid);
        }
        table.entries.insert(
            uuid,
            Accessory {
                record: shared,
                port,
                bridge,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().entries.is_empty()
    }
}

fn record_json(record: &DeviceRecord) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}
