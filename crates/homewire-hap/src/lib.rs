//! Homewire HAP - Bridge framework contract
//!
//! This crate models the home-automation bridge framework the daemon talks
//! to: the service/characteristic catalog, the accessory directory and the
//! capability port traits, plus an in-memory implementation used by the
//! daemon binary and the test suites.

pub mod catalog;
pub mod memory;
pub mod port;

pub use catalog::{Access, CharacteristicSpec, ServiceKind};
pub use memory::{MemoryAccessory, MemoryDirectory, MemoryService};
pub use port::{derive_uuid, AccessoryDirectory, AccessoryPort, GetHook, ServicePort, SetHook};
