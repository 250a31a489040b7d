//! Error kinds recovered into protocol results

use thiserror::Error;

/// Everything that can go wrong while handling a client message.
///
/// None of these are fatal; each maps to a `success: false` result envelope
/// whose message is the `Display` form below (the wire protocol uses Title
/// Case messages).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The inbound frame was not parseable JSON.
    #[error("{raw} Not In JSON Format")]
    NotJson { raw: String },

    /// The envelope was JSON but lacked topic, payload or id.
    #[error("Message Must Contain A Topic, Payload & Id")]
    MissingFields,

    /// The topic is not part of the protocol.
    #[error("Topic Is Not Supported")]
    UnsupportedTopic,

    /// No accessory with the given id is registered.
    #[error("Accessory {id} Does Not Exist")]
    AccessoryNotFound { id: String },

    /// The accessory's declared service is not recognized by the framework.
    #[error("This Accessory Does Not Have \"{service}\" Service")]
    ServiceNotPresent { service: String },

    /// An add payload element did not describe a device.
    #[error("Accessory Payload Is Not Valid")]
    InvalidDevice,
}
