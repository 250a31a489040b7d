//! In-memory accessory directory
//!
//! A self-contained implementation of the framework contract, used as the
//! daemon's default directory and as the test double. Services record pushed
//! values and installed hooks, and expose controller-side entry points so
//! tests can drive reads and writes the way a home-automation controller
//! would.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use homewire_core::DeviceRecord;

use crate::catalog::ServiceKind;
use crate::port::{AccessoryDirectory, AccessoryPort, GetHook, ServicePort, SetHook};

/// One service of one in-memory accessory.
pub struct MemoryService {
    kind: ServiceKind,
    values: Mutex<HashMap<String, Value>>,
    set_hooks: Mutex<HashMap<String, SetHook>>,
    get_hooks: Mutex<HashMap<String, GetHook>>,
}

impl MemoryService {
    fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            values: Mutex::new(HashMap::new()),
            set_hooks: Mutex::new(HashMap::new()),
            get_hooks: Mutex::new(HashMap::new()),
        }
    }

    /// Last value pushed via `update_characteristic`.
    pub fn pushed(&self, name: &str) -> Option<Value> {
        self.values.lock().get(name).cloned()
    }

    pub fn has_set_hook(&self, name: &str) -> bool {
        self.set_hooks.lock().contains_key(name)
    }

    pub fn has_get_hook(&self, name: &str) -> bool {
        self.get_hooks.lock().contains_key(name)
    }

    /// Drive the set hook the way a controller write would. Returns false
    /// when no hook is installed for the name.
    pub fn controller_set(&self, name: &str, value: Value) -> bool {
        let hooks = self.set_hooks.lock();
        match hooks.get(name) {
            Some(hook) => {
                hook(value);
                true
            }
            None => false,
        }
    }

    /// Drive the get hook the way a controller read would.
    pub fn controller_get(&self, name: &str) -> Option<Value> {
        let hooks = self.get_hooks.lock();
        hooks.get(name).map(|hook| hook())
    }
}

impl ServicePort for MemoryService {
    fn kind(&self) -> ServiceKind {
        self.kind
    }

    fn update_characteristic(&self, name: &str, value: Value) {
        self.values.lock().insert(name.to_string(), value);
    }

    fn on_set(&self, name: &str, hook: SetHook) {
        self.set_hooks.lock().insert(name.to_string(), hook);
    }

    fn on_get(&self, name: &str, hook: GetHook) {
        self.get_hooks.lock().insert(name.to_string(), hook);
    }
}

/// One in-memory accessory object.
pub struct MemoryAccessory {
    uuid: Uuid,
    name: String,
    services: Mutex<HashMap<ServiceKind, Arc<MemoryService>>>,
    context: Mutex<Option<DeviceRecord>>,
}

impl MemoryAccessory {
    pub fn new(name: &str, uuid: Uuid) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            name: name.to_string(),
            services: Mutex::new(HashMap::new()),
            context: Mutex::new(None),
        })
    }

    /// Concrete service handle for inspection and controller-side driving.
    /// Unlike [`AccessoryPort::service`] this does not create the service.
    pub fn memory_service(&self, kind: ServiceKind) -> Option<Arc<MemoryService>> {
        self.services.lock().get(&kind).cloned()
    }
}

impl AccessoryPort for MemoryAccessory {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn service(&self, kind: ServiceKind) -> Arc<dyn ServicePort> {
        let mut services = self.services.lock();
        services
            .entry(kind)
            .or_insert_with(|| Arc::new(MemoryService::new(kind)))
            .clone()
    }

    fn context(&self) -> Option<DeviceRecord> {
        self.context.lock().clone()
    }

    fn set_context(&self, record: &DeviceRecord) {
        *self.context.lock() = Some(record.clone());
    }
}

/// In-memory accessory directory.
#[derive(Default)]
pub struct MemoryDirectory {
    accessories: Mutex<HashMap<Uuid, Arc<MemoryAccessory>>>,
    registered: Mutex<HashSet<Uuid>>,
    cache: Mutex<Vec<Arc<MemoryAccessory>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete accessory handle, for tests and controller-side driving.
    pub fn accessory(&self, uuid: Uuid) -> Option<Arc<MemoryAccessory>> {
        self.accessories.lock().get(&uuid).cloned()
    }

    pub fn is_registered(&self, uuid: Uuid) -> bool {
        self.registered.lock().contains(&uuid)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.lock().len()
    }

    /// Stage an accessory as restored-from-cache; it is handed out by the
    /// next `cached()` call.
    pub fn seed_cache(&self, accessory: Arc<MemoryAccessory>) {
        self.cache.lock().push(accessory);
    }
}

impl AccessoryDirectory for MemoryDirectory {
    fn create(&self, name: &str, uuid: Uuid) -> Arc<dyn AccessoryPort> {
        let accessory = MemoryAccessory::new(name, uuid);
        self.accessories.lock().insert(uuid, accessory.clone());
        accessory
    }

    fn register(&self, port: &Arc<dyn AccessoryPort>) {
        self.registered.lock().insert(port.uuid());
        debug!(uuid = %port.uuid(), name = %port.display_name(), "Accessory registered");
    }

    fn update(&self, port: &Arc<dyn AccessoryPort>) {
        debug!(uuid = %port.uuid(), name = %port.display_name(), "Accessory updated");
    }

    fn unregister(&self, port: &Arc<dyn AccessoryPort>) {
        let uuid = port.uuid();
        self.accessories.lock().remove(&uuid);
        self.registered.lock().remove(&uuid);
        debug!(uuid = %uuid, "Accessory unregistered");
    }

    fn cached(&self) -> Vec<Arc<dyn AccessoryPort>> {
        let restored: Vec<Arc<MemoryAccessory>> = self.cache.lock().drain(..).collect();
        let mut accessories = self.accessories.lock();
        let mut registered = self.registered.lock();
        restored
            .into_iter()
            .map(|accessory| {
                accessories.insert(accessory.uuid(), accessory.clone());
                registered.insert(accessory.uuid());
                accessory as Arc<dyn AccessoryPort>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::derive_uuid;
    use serde_json::json;

    #[test]
    fn test_service_lookup_creates_once() {
        let accessory = MemoryAccessory::new("Lamp", derive_uuid("1"));
        accessory.service(ServiceKind::Lightbulb);
        let first = accessory.memory_service(ServiceKind::Lightbulb).unwrap();
        accessory.service(ServiceKind::Lightbulb);
        let second = accessory.memory_service(ServiceKind::Lightbulb).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_update_characteristic_is_observable() {
        let service = MemoryService::new(ServiceKind::Lightbulb);
        service.update_characteristic("On", json!(true));
        assert_eq!(service.pushed("On"), Some(json!(true)));
    }

    #[test]
    fn test_controller_set_invokes_hook() {
        let service = MemoryService::new(ServiceKind::Lightbulb);
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        service.on_set("On", Box::new(move |value| *sink.lock() = Some(value)));
        assert!(service.controller_set("On", json!(true)));
        assert_eq!(*seen.lock(), Some(json!(true)));
    }

    #[test]
    fn test_controller_set_without_hook() {
        let service = MemoryService::new(ServiceKind::Lightbulb);
        assert!(!service.controller_set("On", json!(true)));
    }

    #[test]
    fn test_directory_register_unregister() {
        let directory = MemoryDirectory::new();
        let uuid = derive_uuid("1");
        let port = directory.create("Lamp", uuid);
        directory.register(&port);
        assert!(directory.is_registered(uuid));
        directory.unregister(&port);
        assert!(!directory.is_registered(uuid));
        assert!(directory.accessory(uuid).is_none());
    }

    #[test]
    fn test_cached_drains_once() {
        let directory = MemoryDirectory::new();
        directory.seed_cache(MemoryAccessory::new("Lamp", derive_uuid("1")));
        assert_eq!(directory.cached().len(), 1);
        assert!(directory.cached().is_empty());
        assert!(directory.is_registered(derive_uuid("1")));
    }
}
