#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use embedded_storage_async::nor_flash::{ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash};
use rmk_default_layer::{
    DefaultLayerConfig, DefaultLayerManager, DefaultLayerSaveSignal, EndpointInstance, EndpointSelector, LayerEngine,
    LayerError, SettingsBackend,
};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// 1 USB + 3 BLE profiles
pub const NUM_ENDPOINT: usize = 4;
pub const NUM_LAYER: usize = 6;

pub type TestManager<'a> = DefaultLayerManager<'a, &'a RefCell<MockLayers>, TestEndpoint<'a>, NUM_ENDPOINT, NUM_LAYER>;

/// Default layers 1..=4, out of 6 layers
pub fn test_config() -> DefaultLayerConfig {
    DefaultLayerConfig {
        min_index: 1,
        max_index: 4,
        ..Default::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerCall {
    Activate(u8),
    Deactivate(u8),
}

/// Layer engine recording every call
#[derive(Debug, Default)]
pub struct MockLayers {
    pub active: [bool; NUM_LAYER],
    pub default_layer: u8,
    pub calls: Vec<LayerCall>,
    pub refuse_activate: Vec<u8>,
    pub refuse_deactivate: Vec<u8>,
}

impl MockLayers {
    pub fn with_default_layer(default_layer: u8) -> Self {
        Self {
            default_layer,
            ..Default::default()
        }
    }

    pub fn active_layers(&self) -> Vec<u8> {
        (0..NUM_LAYER as u8).filter(|l| self.active[*l as usize]).collect()
    }
}

impl LayerEngine for MockLayers {
    fn activate_layer(&mut self, layer: u8) -> Result<(), LayerError> {
        self.calls.push(LayerCall::Activate(layer));
        if layer as usize >= NUM_LAYER || self.refuse_activate.contains(&layer) {
            return Err(LayerError::InvalidLayer(layer));
        }
        self.active[layer as usize] = true;
        Ok(())
    }

    fn deactivate_layer(&mut self, layer: u8) -> Result<(), LayerError> {
        self.calls.push(LayerCall::Deactivate(layer));
        if layer as usize >= NUM_LAYER || self.refuse_deactivate.contains(&layer) {
            return Err(LayerError::InvalidLayer(layer));
        }
        self.active[layer as usize] = false;
        Ok(())
    }

    fn default_layer(&self) -> Result<u8, LayerError> {
        Ok(self.default_layer)
    }
}

/// Selected endpoint controlled by the test
pub struct TestEndpoint<'a>(pub &'a Cell<EndpointInstance>);

impl EndpointSelector for TestEndpoint<'_> {
    fn selected(&self) -> EndpointInstance {
        self.0.get()
    }
}

pub fn new_manager<'a>(
    layers: &'a RefCell<MockLayers>,
    selected: &'a Cell<EndpointInstance>,
    save_signal: &'a DefaultLayerSaveSignal<NUM_ENDPOINT>,
) -> TestManager<'a> {
    DefaultLayerManager::new(test_config(), layers, TestEndpoint(selected), save_signal)
}

/// In-memory settings
#[derive(Debug, Default)]
pub struct MemorySettings {
    pub records: HashMap<u32, Vec<u8>>,
    pub saves: usize,
    pub fail: bool,
}

impl SettingsBackend for MemorySettings {
    type Error = &'static str;

    async fn load(&mut self, key: u32, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        if self.fail {
            return Err("read failed");
        }
        Ok(self.records.get(&key).map(|record| {
            let len = record.len().min(buf.len());
            buf[..len].copy_from_slice(&record[..len]);
            record.len()
        }))
    }

    async fn save(&mut self, key: u32, record: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err("write failed");
        }
        self.saves += 1;
        self.records.insert(key, record.to_vec());
        Ok(())
    }
}

/// Settings which only record writes, shared with the test while a saver task owns it
pub struct RecordingSettings<'a> {
    pub writes: &'a RefCell<Vec<(u32, Vec<u8>)>>,
}

impl SettingsBackend for RecordingSettings<'_> {
    type Error = ();

    async fn load(&mut self, _key: u32, _buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        Ok(None)
    }

    async fn save(&mut self, key: u32, record: &[u8]) -> Result<(), Self::Error> {
        self.writes.borrow_mut().push((key, record.to_vec()));
        Ok(())
    }
}

pub const RAM_FLASH_SECTOR_SIZE: usize = 1024;
pub const RAM_FLASH_SECTORS: usize = 4;

/// NOR flash in RAM: erase sets bytes to 0xFF, write can only clear bits
pub struct RamFlash {
    pub data: Vec<u8>,
}

impl RamFlash {
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; RAM_FLASH_SECTOR_SIZE * RAM_FLASH_SECTORS],
        }
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<core::ops::Range<usize>, NorFlashErrorKind> {
        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl ErrorType for RamFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for RamFlash {
    const READ_SIZE: usize = 1;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.check_range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl NorFlash for RamFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = RAM_FLASH_SECTOR_SIZE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if from as usize % RAM_FLASH_SECTOR_SIZE != 0 || to as usize % RAM_FLASH_SECTOR_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let range = self.check_range(from, (to - from) as usize)?;
        self.data[range].fill(0xFF);
        Ok(())
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if offset as usize % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let range = self.check_range(offset, bytes.len())?;
        for (dst, src) in self.data[range].iter_mut().zip(bytes) {
            *dst &= *src;
        }
        Ok(())
    }
}

/// Blocking NOR flash in RAM, used through `async_flash_wrapper`
pub struct BlockingRamFlash(pub RamFlash);

impl ErrorType for BlockingRamFlash {
    type Error = NorFlashErrorKind;
}

impl embedded_storage::nor_flash::ReadNorFlash for BlockingRamFlash {
    const READ_SIZE: usize = RamFlash::READ_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.0.check_range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.0.data[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.0.data.len()
    }
}

impl embedded_storage::nor_flash::NorFlash for BlockingRamFlash {
    const WRITE_SIZE: usize = RamFlash::WRITE_SIZE;
    const ERASE_SIZE: usize = RamFlash::ERASE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        embassy_futures::block_on(self.0.erase(from, to))
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        embassy_futures::block_on(self.0.write(offset, bytes))
    }
}
