use core::ops::Range;

use embassy_embedded_hal::adapter::BlockingAsync;
use embedded_storage::nor_flash::NorFlash;
use embedded_storage_async::nor_flash::NorFlash as AsyncNorFlash;
use sequential_storage::Error as SSError;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{SerializationError, Value, fetch_item, store_item};

use super::SettingsBackend;
use crate::config::StorageConfig;

// Item header + key + record, according to the doc of `sequential-storage` the buffer should be aligned in 32 bytes
const SETTINGS_BUFFER_SIZE: usize = 128;

/// Raw record stored in the flash, the length of the record is kept by `sequential-storage`
struct RawRecord<'a>(&'a [u8]);

impl<'a> Value<'a> for RawRecord<'a> {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        if buffer.len() < self.0.len() {
            return Err(SerializationError::BufferTooSmall);
        }
        buffer[..self.0.len()].copy_from_slice(self.0);
        Ok(self.0.len())
    }

    fn deserialize_from(buffer: &'a [u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        Ok(RawRecord(buffer))
    }
}

pub fn async_flash_wrapper<F: NorFlash>(flash: F) -> BlockingAsync<F> {
    embassy_embedded_hal::adapter::BlockingAsync::new(flash)
}

/// Settings stored in a NOR flash region, using `sequential-storage`'s map
pub struct FlashSettings<F: AsyncNorFlash> {
    pub(crate) flash: F,
    pub(crate) storage_range: Range<u32>,
    pub(crate) buffer: [u8; SETTINGS_BUFFER_SIZE],
}

impl<F: AsyncNorFlash> FlashSettings<F> {
    pub async fn new(flash: F, config: &StorageConfig) -> Self {
        // Check storage setting
        assert!(
            config.num_sectors >= 2,
            "Number of used sector for storage must larger than 1"
        );

        info!(
            "Flash capacity {} KB, use {} KB({} sectors) starting from 0x{:X} as settings storage",
            flash.capacity() / 1024,
            (F::ERASE_SIZE * config.num_sectors as usize) / 1024,
            config.num_sectors,
            config.start_addr,
        );

        // If config.start_addr == 0, use last `num_sectors` sectors
        let storage_range = if config.start_addr == 0 {
            (flash.capacity() - config.num_sectors as usize * F::ERASE_SIZE) as u32..flash.capacity() as u32
        } else {
            assert!(
                config.start_addr % F::ERASE_SIZE == 0,
                "Storage's start addr MUST BE a multiplier of sector size"
            );
            config.start_addr as u32..(config.start_addr + config.num_sectors as usize * F::ERASE_SIZE) as u32
        };

        let mut settings = Self {
            flash,
            storage_range,
            buffer: [0; SETTINGS_BUFFER_SIZE],
        };

        if config.clear_storage {
            debug!("Clearing storage!");
            if let Err(e) = sequential_storage::erase_all(&mut settings.flash, settings.storage_range.clone()).await {
                print_storage_error::<F>(e);
            }
        }

        settings
    }
}

impl<F: AsyncNorFlash> SettingsBackend for FlashSettings<F> {
    type Error = ();

    async fn load(&mut self, key: u32, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        let read_data = fetch_item::<u32, RawRecord, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key,
        )
        .await
        .map_err(|e| print_storage_error::<F>(e))?;

        Ok(read_data.map(|RawRecord(record)| {
            let len = record.len().min(buf.len());
            buf[..len].copy_from_slice(&record[..len]);
            record.len()
        }))
    }

    async fn save(&mut self, key: u32, record: &[u8]) -> Result<(), Self::Error> {
        store_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key,
            &RawRecord(record),
        )
        .await
        .map_err(|e| print_storage_error::<F>(e))
    }
}

fn print_storage_error<F: AsyncNorFlash>(e: SSError<F::Error>) {
    match e {
        #[cfg(feature = "defmt")]
        SSError::Storage { value: e } => error!("Flash error: {:?}", defmt::Debug2Format(&e)),
        #[cfg(not(feature = "defmt"))]
        SSError::Storage { value: _e } => error!("Flash error"),
        SSError::FullStorage => error!("Storage is full"),
        SSError::Corrupted {} => error!("Storage is corrupted"),
        SSError::BufferTooBig => error!("Buffer too big"),
        SSError::BufferTooSmall(x) => error!("Buffer too small, needs {} bytes", x),
        SSError::SerializationError(e) => error!("Map value error: {:?}", e),
        _ => error!("Unknown storage error"),
    }
}
