//! Capability port traits
//!
//! The traits the framework side of the bridge presents to the core: an
//! accessory directory that creates and tracks accessories, per-accessory
//! ports exposing service lookup, and per-service ports carrying the
//! characteristic push/hook surface.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use homewire_core::DeviceRecord;

use crate::catalog::ServiceKind;

/// Namespace for deterministic accessory identifier derivation.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x9a8f_4e2b_7c31_4d06_b5d2_30c8_51aa_e0f7);

/// Derive the stable accessory identifier from a seed string.
///
/// Same seed, same identifier; the registry keys accessories by this.
pub fn derive_uuid(seed: &str) -> Uuid {
    Uuid::new_v5(&ACCESSORY_NAMESPACE, seed.as_bytes())
}

/// Handler invoked when a controller writes a characteristic.
pub type SetHook = Box<dyn Fn(Value) + Send + Sync>;
/// Handler invoked when a controller reads a characteristic; must return
/// immediately.
pub type GetHook = Box<dyn Fn() -> Value + Send + Sync>;

/// One service (capability category) of one accessory.
pub trait ServicePort: Send + Sync {
    fn kind(&self) -> ServiceKind;

    /// Push a value toward the controller side. Fire-and-forget; never
    /// triggers the set hook.
    fn update_characteristic(&self, name: &str, value: Value);

    /// Install the handler run when a controller writes `name`.
    fn on_set(&self, name: &str, hook: SetHook);

    /// Install the handler run when a controller reads `name`.
    fn on_get(&self, name: &str, hook: GetHook);
}

/// One accessory as the framework sees it.
pub trait AccessoryPort: Send + Sync {
    fn uuid(&self) -> Uuid;

    fn display_name(&self) -> String;

    /// Capability lookup by service kind, creating the service if absent.
    fn service(&self, kind: ServiceKind) -> Arc<dyn ServicePort>;

    /// The framework-persisted device record snapshot, if any.
    fn context(&self) -> Option<DeviceRecord>;

    /// Replace the persisted snapshot (the framework owns persistence).
    fn set_context(&self, record: &DeviceRecord);
}

/// The framework's accessory directory.
pub trait AccessoryDirectory: Send + Sync {
    /// Deterministic identifier derivation (see [`derive_uuid`]).
    fn derive_uuid(&self, seed: &str) -> Uuid {
        derive_uuid(seed)
    }

    /// Construct a new accessory object. Not tracked until registered.
    fn create(&self, name: &str, uuid: Uuid) -> Arc<dyn AccessoryPort>;

    /// Add a newly created accessory to the directory.
    fn register(&self, port: &Arc<dyn AccessoryPort>);

    /// Announce that an already-tracked accessory changed.
    fn update(&self, port: &Arc<dyn AccessoryPort>);

    /// Remove an accessory from the directory.
    fn unregister(&self, port: &Arc<dyn AccessoryPort>);

    /// Accessories restored from a prior session, drained once at startup
    /// before the daemon begins serving.
    fn cached(&self) -> Vec<Arc<dyn AccessoryPort>>;
}
