//! Homewire Core - Protocol and device record types
//!
//! This crate provides the foundational types for the Homewire system:
//! - Device records as exchanged with remote clients
//! - The request/response wire protocol and unsolicited push messages
//! - Error kinds shared between the dispatcher and the registry

pub mod device;
pub mod error;
pub mod protocol;

pub use device::{canonical_id, DeviceRecord};
pub use error::SyncError;
pub use protocol::{PushMessage, ResultEnvelope, RESULT_TOPIC};
