//! Layer activation interface and a reference layer state.

use core::cell::RefCell;

use crate::error::LayerError;

/// The part of a keymap that the default layer engine drives.
pub trait LayerEngine {
    /// Activate given layer
    fn activate_layer(&mut self, layer: u8) -> Result<(), LayerError>;

    /// Deactivate given layer
    fn deactivate_layer(&mut self, layer: u8) -> Result<(), LayerError>;

    /// The global default layer of the keymap, it's always treated as active
    fn default_layer(&self) -> Result<u8, LayerError>;
}

/// Shared keymap, borrowed for the duration of each call.
impl<L: LayerEngine> LayerEngine for &RefCell<L> {
    fn activate_layer(&mut self, layer: u8) -> Result<(), LayerError> {
        self.try_borrow_mut().map_err(|_| LayerError::Busy)?.activate_layer(layer)
    }

    fn deactivate_layer(&mut self, layer: u8) -> Result<(), LayerError> {
        self.try_borrow_mut().map_err(|_| LayerError::Busy)?.deactivate_layer(layer)
    }

    fn default_layer(&self) -> Result<u8, LayerError> {
        self.try_borrow().map_err(|_| LayerError::Busy)?.default_layer()
    }
}

/// Activation state of each layer in a keymap of `NUM_LAYER` layers.
///
/// The conception is borrowed from qmk: <https://docs.qmk.fm/#/keymap>.
/// The default layer is the lowest layer that is checked when looking up a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerState<const NUM_LAYER: usize> {
    /// Current state of each layer
    layer_state: [bool; NUM_LAYER],
    /// Default layer number
    default_layer: u8,
}

impl<const NUM_LAYER: usize> Default for LayerState<NUM_LAYER> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const NUM_LAYER: usize> LayerState<NUM_LAYER> {
    pub const fn new(default_layer: u8) -> Self {
        Self {
            layer_state: [false; NUM_LAYER],
            default_layer,
        }
    }

    /// Set the default layer number
    pub fn set_default_layer(&mut self, layer_num: u8) -> Result<(), LayerError> {
        self.check_layer(layer_num)?;
        self.default_layer = layer_num;
        Ok(())
    }

    /// Whether given layer is activated, the default layer is always active
    pub fn is_active(&self, layer_num: u8) -> bool {
        layer_num == self.default_layer || self.layer_state.get(layer_num as usize).copied().unwrap_or(false)
    }

    /// The highest activated layer
    pub fn get_activated_layer(&self) -> u8 {
        for (layer_idx, active) in self.layer_state.iter().enumerate().rev() {
            if *active || layer_idx as u8 == self.default_layer {
                return layer_idx as u8;
            }
        }

        self.default_layer
    }

    fn check_layer(&self, layer_num: u8) -> Result<(), LayerError> {
        if layer_num as usize >= NUM_LAYER {
            warn!(
                "Not a valid layer {}, keyboard supports only {} layers",
                layer_num, NUM_LAYER
            );
            return Err(LayerError::InvalidLayer(layer_num));
        }
        Ok(())
    }
}

impl<const NUM_LAYER: usize> LayerEngine for LayerState<NUM_LAYER> {
    fn activate_layer(&mut self, layer_num: u8) -> Result<(), LayerError> {
        self.check_layer(layer_num)?;
        self.layer_state[layer_num as usize] = true;
        Ok(())
    }

    fn deactivate_layer(&mut self, layer_num: u8) -> Result<(), LayerError> {
        self.check_layer(layer_num)?;
        self.layer_state[layer_num as usize] = false;
        Ok(())
    }

    fn default_layer(&self) -> Result<u8, LayerError> {
        Ok(self.default_layer)
    }
}
