//! Characteristic bridge
//!
//! Per-accessory adapter between the bridge framework's get/set hooks and
//! the registry. Installed whenever an accessory is created, replaced or
//! restored; owns the accessory's read-prompt suppression window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use homewire_core::{DeviceRecord, PushMessage};
use homewire_hap::{Access, AccessoryPort, ServiceKind, ServicePort};

use crate::hub::ClientHub;

/// Bridges one accessory's characteristics to the framework.
///
/// Controller writes land in the shared record and are announced to every
/// client; controller reads are served from the record immediately and, at
/// most once per suppression window, prompt the clients for a fresher value.
pub struct CharacteristicBridge {
    record: Arc<RwLock<DeviceRecord>>,
    hub: ClientHub,
    window: Duration,
    prompt: Mutex<Option<JoinHandle<()>>>,
}

impl CharacteristicBridge {
    pub fn new(record: Arc<RwLock<DeviceRecord>>, hub: ClientHub, window: Duration) -> Arc<Self> {
        Arc::new(Self {
            record,
            hub,
            window,
            prompt: Mutex::new(None),
        })
    }

    /// Install hooks on the accessory's capability port and push the
    /// record's current state once.
    ///
    /// An unrecognized declared service leaves the accessory without hooks;
    /// client `set` requests degrade to a service-missing outcome later.
    pub fn install(self: &Arc<Self>, port: &Arc<dyn AccessoryPort>) {
        let record = self.record.read().clone();

        let information = port.service(ServiceKind::AccessoryInformation);
        information.update_characteristic("Manufacturer", Value::String(record.manufacturer().to_string()));
        information.update_characteristic("Model", Value::String(record.model().to_string()));
        information.update_characteristic("SerialNumber", Value::String(record.serial().to_string()));

        let Some(kind) = ServiceKind::from_name(&record.service) else {
            warn!(
                accessory = %record.canonical_id(),
                service = %record.service,
                "Declared service not recognized, no hooks installed"
            );
            return;
        };

        let service = port.service(kind);
        service.update_characteristic("Name", Value::String(record.name.clone()));

        for (name, value) in &record.characteristics {
            let Some(spec) = kind.characteristic(name) else {
                debug!(characteristic = %name, service = %kind, "Unrecognized characteristic, skipped");
                continue;
            };
            if spec.access == Access::ReadWrite {
                let bridge = Arc::clone(self);
                let name = spec.name;
                service.on_set(spec.name, Box::new(move |value| bridge.controller_set(name, value)));
            }
            let bridge = Arc::clone(self);
            let name = spec.name;
            service.on_get(spec.name, Box::new(move || bridge.controller_get(name)));
            service.update_characteristic(spec.name, value.clone());
        }

        self.clear_prompt();
    }

    /// Set hook body: store the written value and announce the full record
    /// to every client. Every write is announced, no debounce.
    fn controller_set(&self, name: &str, value: Value) {
        let record = {
            let mut record = self.record.write();
            record.characteristics.insert(name.to_string(), value.clone());
            record.clone()
        };
        debug!(accessory = %record.canonical_id(), characteristic = name, value = %value, "Controller write");
        self.hub.broadcast(PushMessage::Set(record));
    }

    /// Get hook body: answer from the record immediately, prompting clients
    /// for a refresh at most once per suppression window.
    fn controller_get(&self, name: &str) -> Value {
        self.request_refresh();
        self.record
            .read()
            .characteristics
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn request_refresh(&self) {
        let mut prompt = self.prompt.lock();
        if prompt.as_ref().is_some_and(|window| !window.is_finished()) {
            return;
        }
        let id = self.record.read().id.clone();
        debug!(accessory = %homewire_core::canonical_id(&id), "Prompting clients for a fresh value");
        self.hub.broadcast(PushMessage::Get(id));
        let window = self.window;
        *prompt = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
        }));
    }

    /// Abort the suppression window, reopening prompts immediately. Called
    /// when the accessory is replaced and when a client answers a prompt
    /// with a `set` request.
    pub fn clear_prompt(&self) {
        if let Some(window) = self.prompt.lock().take() {
            window.abort();
        }
    }
}

impl Drop for CharacteristicBridge {
    fn drop(&mut self) {
        if let Some(window) = self.prompt.lock().take() {
            window.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewire_hap::MemoryAccessory;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    fn lamp_record() -> DeviceRecord {
        serde_json::from_value(json!({
            "id": 1,
            "name": "Lamp",
            "service": "Lightbulb",
            "characteristics": {"On": false}
        }))
        .unwrap()
    }

    fn installed(
        record: DeviceRecord,
        window: Duration,
    ) -> (Arc<CharacteristicBridge>, Arc<MemoryAccessory>, ClientHub) {
        let hub = ClientHub::new();
        let accessory = MemoryAccessory::new(&record.name, homewire_hap::derive_uuid(&record.canonical_id()));
        let bridge = CharacteristicBridge::new(Arc::new(RwLock::new(record)), hub.clone(), window);
        let port: Arc<dyn AccessoryPort> = accessory.clone();
        bridge.install(&port);
        (bridge, accessory, hub)
    }

    #[test]
    fn test_install_pushes_information_and_state() {
        let (_bridge, accessory, _hub) = installed(lamp_record(), Duration::from_secs(5));
        let information = accessory.memory_service(ServiceKind::AccessoryInformation).unwrap();
        assert_eq!(
            information.pushed("Manufacturer"),
            Some(json!("Default-Manufacturer"))
        );
        let service = accessory.memory_service(ServiceKind::Lightbulb).unwrap();
        assert_eq!(service.pushed("Name"), Some(json!("Lamp")));
        assert_eq!(service.pushed("On"), Some(json!(false)));
        assert!(service.has_set_hook("On"));
        assert!(service.has_get_hook("On"));
    }

    #[test]
    fn test_install_skips_unknown_service() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 2,
            "name": "Mystery",
            "service": "Toaster",
            "characteristics": {"On": false}
        }))
        .unwrap();
        let (_bridge, accessory, _hub) = installed(record, Duration::from_secs(5));
        assert!(accessory.memory_service(ServiceKind::Lightbulb).is_none());
        // Information is still populated
        assert!(accessory.memory_service(ServiceKind::AccessoryInformation).is_some());
    }

    #[test]
    fn test_read_only_characteristic_gets_no_set_hook() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 3,
            "name": "Blind",
            "service": "WindowCovering",
            "characteristics": {"CurrentPosition": 40, "TargetPosition": 40}
        }))
        .unwrap();
        let (_bridge, accessory, _hub) = installed(record, Duration::from_secs(5));
        let service = accessory.memory_service(ServiceKind::WindowCovering).unwrap();
        assert!(!service.has_set_hook("CurrentPosition"));
        assert!(service.has_get_hook("CurrentPosition"));
        assert!(service.has_set_hook("TargetPosition"));
    }

    #[test]
    fn test_unrecognized_characteristic_is_inert() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 4,
            "name": "Lamp",
            "service": "Lightbulb",
            "characteristics": {"On": true, "SpinCycle": 9}
        }))
        .unwrap();
        let (_bridge, accessory, _hub) = installed(record, Duration::from_secs(5));
        let service = accessory.memory_service(ServiceKind::Lightbulb).unwrap();
        assert!(!service.has_set_hook("SpinCycle"));
        assert!(!service.has_get_hook("SpinCycle"));
        assert_eq!(service.pushed("SpinCycle"), None);
    }

    #[tokio::test]
    async fn test_controller_write_updates_record_and_broadcasts() {
        let (bridge, accessory, hub) = installed(lamp_record(), Duration::from_secs(5));
        let mut pushes = hub.subscribe();
        let service = accessory.memory_service(ServiceKind::Lightbulb).unwrap();

        assert!(service.controller_set("On", json!(true)));

        assert_eq!(bridge.record.read().characteristics["On"], json!(true));
        match pushes.recv().await.unwrap() {
            PushMessage::Set(record) => {
                assert_eq!(record.characteristics["On"], json!(true));
                assert_eq!(record.name, "Lamp");
            }
            other => panic!("expected set push, got {other:?}"),
        }
        assert_eq!(pushes.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_controller_reads_prompt_once_per_window() {
        let (_bridge, accessory, hub) = installed(lamp_record(), Duration::from_millis(50));
        let mut pushes = hub.subscribe();
        let service = accessory.memory_service(ServiceKind::Lightbulb).unwrap();

        assert_eq!(service.controller_get("On"), Some(json!(false)));
        assert_eq!(service.controller_get("On"), Some(json!(false)));

        assert_eq!(pushes.recv().await.unwrap(), PushMessage::Get(json!(1)));
        assert_eq!(pushes.try_recv().unwrap_err(), TryRecvError::Empty);

        tokio::time::sleep(Duration::from_millis(120)).await;
        service.controller_get("On");
        assert_eq!(pushes.recv().await.unwrap(), PushMessage::Get(json!(1)));
    }

    #[tokio::test]
    async fn test_clear_prompt_reopens_window() {
        let (bridge, accessory, hub) = installed(lamp_record(), Duration::from_secs(60));
        let mut pushes = hub.subscribe();
        let service = accessory.memory_service(ServiceKind::Lightbulb).unwrap();

        service.controller_get("On");
        bridge.clear_prompt();
        service.controller_get("On");

        assert_eq!(pushes.recv().await.unwrap(), PushMessage::Get(json!(1)));
        assert_eq!(pushes.recv().await.unwrap(), PushMessage::Get(json!(1)));
    }
}
