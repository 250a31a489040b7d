//! Service and characteristic catalog
//!
//! A closed registry of the services the framework recognizes and, for each
//! service, the characteristic names it accepts. Hook installation looks
//! names up here instead of dispatching on runtime-assembled handler names;
//! characteristic names outside the catalog are silently inert.

/// Whether a controller may write a characteristic or only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Controllers read; only clients update the value.
    Read,
    /// Controllers read and write.
    ReadWrite,
}

/// One characteristic the framework recognizes for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSpec {
    pub name: &'static str,
    pub access: Access,
}

const fn rw(name: &'static str) -> CharacteristicSpec {
    CharacteristicSpec { name, access: Access::ReadWrite }
}

const fn ro(name: &'static str) -> CharacteristicSpec {
    CharacteristicSpec { name, access: Access::Read }
}

/// A capability category an accessory can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Identity service present on every accessory
    AccessoryInformation,
    Lightbulb,
    Switch,
    WindowCovering,
    GarageDoorOpener,
    LockMechanism,
    Valve,
}

const INFORMATION: &[CharacteristicSpec] =
    &[ro("Name"), ro("Manufacturer"), ro("Model"), ro("SerialNumber")];

const LIGHTBULB: &[CharacteristicSpec] = &[
    rw("On"),
    rw("Brightness"),
    rw("Hue"),
    rw("Saturation"),
    rw("ColorTemperature"),
];

const SWITCH: &[CharacteristicSpec] = &[rw("On")];

const WINDOW_COVERING: &[CharacteristicSpec] =
    &[ro("CurrentPosition"), ro("PositionState"), rw("TargetPosition")];

const GARAGE_DOOR_OPENER: &[CharacteristicSpec] = &[
    ro("CurrentDoorState"),
    ro("ObstructionDetected"),
    rw("TargetDoorState"),
];

const LOCK_MECHANISM: &[CharacteristicSpec] = &[ro("LockCurrentState"), rw("LockTargetState")];

const VALVE: &[CharacteristicSpec] = &[rw("Active"), ro("InUse"), ro("ValveType")];

impl ServiceKind {
    /// Resolve a service name from a device record. Unknown names yield
    /// `None`; the accessory still registers, but no hooks are installed and
    /// client `set` requests degrade to a service-missing outcome.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AccessoryInformation" => Some(Self::AccessoryInformation),
            "Lightbulb" => Some(Self::Lightbulb),
            "Switch" => Some(Self::Switch),
            "WindowCovering" => Some(Self::WindowCovering),
            "GarageDoorOpener" => Some(Self::GarageDoorOpener),
            "LockMechanism" => Some(Self::LockMechanism),
            "Valve" => Some(Self::Valve),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AccessoryInformation => "AccessoryInformation",
            Self::Lightbulb => "Lightbulb",
            Self::Switch => "Switch",
            Self::WindowCovering => "WindowCovering",
            Self::GarageDoorOpener => "GarageDoorOpener",
            Self::LockMechanism => "LockMechanism",
            Self::Valve => "Valve",
        }
    }

    /// The characteristics recognized for this service.
    pub fn characteristics(&self) -> &'static [CharacteristicSpec] {
        match self {
            Self::AccessoryInformation => INFORMATION,
            Self::Lightbulb => LIGHTBULB,
            Self::Switch => SWITCH,
            Self::WindowCovering => WINDOW_COVERING,
            Self::GarageDoorOpener => GARAGE_DOOR_OPENER,
            Self::LockMechanism => LOCK_MECHANISM,
            Self::Valve => VALVE,
        }
    }

    /// Look up one characteristic by name.
    pub fn characteristic(&self, name: &str) -> Option<&'static CharacteristicSpec> {
        self.characteristics().iter().find(|spec| spec.name == name)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
