use core::fmt;

use crate::endpoint::EndpointInstance;

/// Errors of the default layer engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DefaultLayerError {
    /// The layer is not in the keymap, or not in the configured default layer range
    InvalidLayer(u8),
    /// The endpoint has no slot in the default layer table
    InvalidEndpoint(EndpointInstance),
    /// The layer engine couldn't be queried, e.g. the keymap is borrowed by another task
    LayerEngine(LayerError),
    /// The layer engine refused to activate the default layer.
    ///
    /// The table keeps the new value, the active layers are fixed by the next successful reconciliation.
    ActivationFailed(u8),
    /// Persisted record doesn't match the size of the default layer table
    RecordSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DefaultLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultLayerError::InvalidLayer(layer) => write!(f, "layer {} can't be used as default layer", layer),
            DefaultLayerError::InvalidEndpoint(endpoint) => write!(f, "no default layer slot for {}", endpoint),
            DefaultLayerError::LayerEngine(e) => write!(f, "layer engine error: {}", e),
            DefaultLayerError::ActivationFailed(layer) => write!(f, "failed to activate default layer {}", layer),
            DefaultLayerError::RecordSizeMismatch { expected, actual } => {
                write!(f, "default layer record has {} bytes, expected {}", actual, expected)
            }
        }
    }
}

/// Errors reported by a [`LayerEngine`](crate::LayerEngine)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerError {
    /// The layer doesn't exist in the keymap
    InvalidLayer(u8),
    /// The keymap is busy, e.g. it's borrowed by another task
    Busy,
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::InvalidLayer(layer) => write!(f, "invalid layer {}", layer),
            LayerError::Busy => write!(f, "keymap is busy"),
        }
    }
}
