//! Output endpoints, and the dense index used to address the default layer table

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::event::{EndpointChangedEvent, publish_endpoint_changed};

/// Number of USB endpoints, USB always occupies index 0
pub const USB_ENDPOINT_COUNT: usize = 1;

/// Current connection type, see [`ConnectionType`]
pub(crate) static CONNECTION_TYPE: AtomicU8 = AtomicU8::new(0);
/// Current active BLE profile
pub(crate) static ACTIVE_PROFILE: AtomicU8 = AtomicU8::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionType {
    Usb,
    Ble,
}

impl From<u8> for ConnectionType {
    fn from(value: u8) -> Self {
        match value {
            0 => ConnectionType::Usb,
            1 => ConnectionType::Ble,
            _ => ConnectionType::Usb,
        }
    }
}

impl From<ConnectionType> for u8 {
    fn from(value: ConnectionType) -> Self {
        match value {
            ConnectionType::Usb => 0,
            ConnectionType::Ble => 1,
        }
    }
}

/// An output endpoint, reports are sent to exactly one endpoint at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointInstance {
    Usb,
    /// BLE, with the profile number
    Ble(u8),
}

impl EndpointInstance {
    pub fn connection_type(&self) -> ConnectionType {
        match self {
            EndpointInstance::Usb => ConnectionType::Usb,
            EndpointInstance::Ble(_) => ConnectionType::Ble,
        }
    }

    /// Index of the endpoint, USB first, then BLE profiles in order
    pub fn index(&self) -> usize {
        match self {
            EndpointInstance::Usb => 0,
            EndpointInstance::Ble(profile) => USB_ENDPOINT_COUNT + *profile as usize,
        }
    }

    /// Get the endpoint at given index, `None` if `index >= NUM_ENDPOINT`
    pub fn from_index<const NUM_ENDPOINT: usize>(index: usize) -> Option<Self> {
        if index >= NUM_ENDPOINT {
            return None;
        }
        if index < USB_ENDPOINT_COUNT {
            Some(EndpointInstance::Usb)
        } else {
            u8::try_from(index - USB_ENDPOINT_COUNT).ok().map(EndpointInstance::Ble)
        }
    }
}

impl fmt::Display for EndpointInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointInstance::Usb => write!(f, "USB"),
            EndpointInstance::Ble(profile) => write!(f, "BLE:{}", profile),
        }
    }
}

/// Source of the currently selected endpoint
pub trait EndpointSelector {
    fn selected(&self) -> EndpointInstance;
}

/// Selected endpoint stored in the global connection state
#[derive(Clone, Copy, Debug, Default)]
pub struct ActiveEndpoint;

impl EndpointSelector for ActiveEndpoint {
    fn selected(&self) -> EndpointInstance {
        current_endpoint()
    }
}

/// Read the selected endpoint from the connection state
pub fn current_endpoint() -> EndpointInstance {
    match ConnectionType::from(CONNECTION_TYPE.load(Ordering::Acquire)) {
        ConnectionType::Usb => EndpointInstance::Usb,
        ConnectionType::Ble => EndpointInstance::Ble(ACTIVE_PROFILE.load(Ordering::Acquire)),
    }
}

/// Update the selected endpoint.
///
/// [`EndpointChangedEvent`] is published only when the selection actually changes.
pub fn set_selected_endpoint(endpoint: EndpointInstance) {
    let previous = current_endpoint();
    if let EndpointInstance::Ble(profile) = endpoint {
        ACTIVE_PROFILE.store(profile, Ordering::Release);
    }
    CONNECTION_TYPE.store(endpoint.connection_type().into(), Ordering::Release);

    if previous != endpoint {
        debug!("Selected endpoint changed: {} -> {}", previous, endpoint);
        publish_endpoint_changed(EndpointChangedEvent::new(endpoint));
    }
}
