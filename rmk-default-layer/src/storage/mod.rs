//! Persistence of the default layer table
//!
//! Changes are written by [`DefaultLayerSaver`] after a debounce interval, so a burst of changes costs one write.

#[cfg(feature = "storage")]
mod flash;

use embassy_futures::select::{Either, select};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
#[cfg(feature = "storage")]
pub use flash::{FlashSettings, async_flash_wrapper};

use crate::table::DefaultLayerTable;

/// Key of the default layer record in the settings storage
pub const DEFAULT_LAYER_SETTINGS_KEY: u32 = 0x7000;

/// Signal carrying the latest default layer table to [`DefaultLayerSaver`].
///
/// A pending table is replaced by a newer one, so at most one save is pending at any time.
pub type DefaultLayerSaveSignal<const NUM_ENDPOINT: usize> = Signal<crate::RawMutex, DefaultLayerTable<NUM_ENDPOINT>>;

/// A key/value settings storage, records are raw bytes.
pub trait SettingsBackend {
    type Error: core::fmt::Debug;

    /// Read the record stored under `key` into `buf`.
    ///
    /// Returns the full length of the stored record, which can be larger than `buf`;
    /// only the first `buf.len()` bytes are copied in that case.
    /// Returns `None` if there's no record under `key`.
    async fn load(&mut self, key: u32, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Store `record` under `key`, replacing the previous record
    async fn save(&mut self, key: u32, record: &[u8]) -> Result<(), Self::Error>;
}

impl<S: SettingsBackend> SettingsBackend for &mut S {
    type Error = S::Error;

    async fn load(&mut self, key: u32, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        (**self).load(key, buf).await
    }

    async fn save(&mut self, key: u32, record: &[u8]) -> Result<(), Self::Error> {
        (**self).save(key, record).await
    }
}

/// Task which saves the default layer table after it stops changing for `debounce`.
pub struct DefaultLayerSaver<'a, S: SettingsBackend, const NUM_ENDPOINT: usize> {
    signal: &'a DefaultLayerSaveSignal<NUM_ENDPOINT>,
    backend: S,
    debounce: Duration,
}

impl<'a, S: SettingsBackend, const NUM_ENDPOINT: usize> DefaultLayerSaver<'a, S, NUM_ENDPOINT> {
    pub fn new(signal: &'a DefaultLayerSaveSignal<NUM_ENDPOINT>, backend: S, debounce: Duration) -> Self {
        Self {
            signal,
            backend,
            debounce,
        }
    }

    pub async fn run(&mut self) -> ! {
        loop {
            let table = self.wait_for_save().await;
            self.save(&table).await;
        }
    }

    /// Wait for a changed table, then wait until it's unchanged for `debounce`.
    ///
    /// Every newer table restarts the timer.
    pub(crate) async fn wait_for_save(&self) -> DefaultLayerTable<NUM_ENDPOINT> {
        let mut table = self.signal.wait().await;
        loop {
            match select(Timer::after(self.debounce), self.signal.wait()).await {
                Either::First(_) => return table,
                Either::Second(newer) => {
                    debug!("Default layers changed again, rescheduling save");
                    table = newer;
                }
            }
        }
    }

    /// Write the table to the backend.
    ///
    /// Failures are logged only, the next change schedules another save.
    pub async fn save(&mut self, table: &DefaultLayerTable<NUM_ENDPOINT>) {
        match self.backend.save(DEFAULT_LAYER_SETTINGS_KEY, table.as_record()).await {
            Ok(()) => debug!("Saved default layers: {:?}", table),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                error!("Failed to save default layers: {:?}", defmt::Debug2Format(&_e));
                #[cfg(not(feature = "defmt"))]
                error!("Failed to save default layers: {:?}", _e);
            }
        }
    }
}
