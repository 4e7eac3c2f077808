//! Key binding commands for default layers

use embassy_sync::channel::Channel;

/// Command id: use `param2` as default layer of the current endpoint
pub const DEFAULT_LAYER_CMD_SELECT: u32 = 0;
/// Command id: advance the default layer of the current endpoint
pub const DEFAULT_LAYER_CMD_NEXT: u32 = 1;

/// Capacity of [`DEFAULT_LAYER_COMMAND_CHANNEL`]
pub const DEFAULT_LAYER_COMMAND_CHANNEL_SIZE: usize = 4;

/// Channel for default layer bindings, pressed keys bound to the default layer behavior are sent here
pub static DEFAULT_LAYER_COMMAND_CHANNEL: Channel<
    crate::RawMutex,
    DefaultLayerBinding,
    DEFAULT_LAYER_COMMAND_CHANNEL_SIZE,
> = Channel::new();

/// Parameters of a key bound to the default layer behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DefaultLayerBinding {
    /// Command id
    pub param1: u32,
    /// Layer, used by [`DEFAULT_LAYER_CMD_SELECT`] only
    pub param2: u32,
}

impl DefaultLayerBinding {
    pub const fn select(layer: u8) -> Self {
        Self {
            param1: DEFAULT_LAYER_CMD_SELECT,
            param2: layer as u32,
        }
    }

    pub const fn next() -> Self {
        Self {
            param1: DEFAULT_LAYER_CMD_NEXT,
            param2: 0,
        }
    }

    /// Decode the command, `None` for unknown command ids
    pub fn command(&self) -> Option<DefaultLayerCommand> {
        match self.param1 {
            // Layers that don't fit in u8 are never valid, saturate so that they're rejected as invalid layer
            DEFAULT_LAYER_CMD_SELECT => Some(DefaultLayerCommand::Select(
                u8::try_from(self.param2).unwrap_or(u8::MAX),
            )),
            DEFAULT_LAYER_CMD_NEXT => Some(DefaultLayerCommand::Next),
            _ => None,
        }
    }
}

/// Default layer commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DefaultLayerCommand {
    /// Use the layer as default layer of the current endpoint
    Select(u8),
    /// Use the next layer in the configured range, wraps to the lowest one
    Next,
}

/// Result of a key binding that was handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BehaviorOutcome {
    /// The key event is consumed
    Opaque,
}

/// Get the next default layer in `min..=max`.
///
/// Layers at or above `max` wrap to `min`, so do layers below `min`.
pub(crate) fn next_default_layer(current: u8, min: u8, max: u8) -> u8 {
    if current >= max || current < min { min } else { current + 1 }
}
