use embassy_time::Duration;

/// Default debounce interval before the default layer table is written to storage
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 60_000;

/// Config for per-endpoint default layers.
///
/// Only layers in `min_index..=max_index` can be stored as a default layer.
/// The number of endpoints and the number of layers are const generics of
/// [`DefaultLayerManager`](crate::DefaultLayerManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DefaultLayerConfig {
    /// Lowest layer that can be used as default layer
    pub min_index: u8,
    /// Highest layer that can be used as default layer
    pub max_index: u8,
    /// Time to wait after the last change before saving the table
    pub save_debounce: Duration,
}

impl Default for DefaultLayerConfig {
    fn default() -> Self {
        Self {
            min_index: 0,
            max_index: 0,
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
        }
    }
}

impl DefaultLayerConfig {
    /// Check the config against the number of layers in the keymap.
    pub(crate) fn validate<const NUM_LAYER: usize>(&self) {
        assert!(
            self.min_index <= self.max_index,
            "Default layer min_index must not be larger than max_index"
        );
        assert!(
            (self.max_index as usize) < NUM_LAYER,
            "Default layer max_index must be a valid layer of the keymap"
        );
    }

    /// Whether `layer` can be stored as a default layer
    pub(crate) fn contains(&self, layer: u8) -> bool {
        self.min_index <= layer && layer <= self.max_index
    }
}

/// Config for the flash region used to persist settings
#[cfg(feature = "storage")]
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageConfig {
    /// Start address of local storage, MUST BE start of a sector.
    /// If start_addr is set to 0(this is the default value), the last `num_sectors` sectors will be used.
    pub start_addr: usize,
    // Number of sectors used for storage, >= 2.
    pub num_sectors: u8,
    pub clear_storage: bool,
}

#[cfg(feature = "storage")]
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            start_addr: 0,
            num_sectors: 2,
            clear_storage: false,
        }
    }
}
