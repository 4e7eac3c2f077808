#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod behavior;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod layer;
pub mod manager;
pub mod storage;
pub mod table;

pub use behavior::{BehaviorOutcome, DEFAULT_LAYER_COMMAND_CHANNEL, DefaultLayerBinding, DefaultLayerCommand};
#[cfg(feature = "storage")]
pub use config::StorageConfig;
pub use config::DefaultLayerConfig;
pub use endpoint::{ActiveEndpoint, EndpointInstance, EndpointSelector, set_selected_endpoint};
pub use error::{DefaultLayerError, LayerError};
pub use event::{EndpointChangedEvent, publish_endpoint_changed};
pub use layer::{LayerEngine, LayerState};
pub use manager::DefaultLayerManager;
#[cfg(feature = "storage")]
pub use storage::{FlashSettings, async_flash_wrapper};
pub use storage::{DEFAULT_LAYER_SETTINGS_KEY, DefaultLayerSaveSignal, DefaultLayerSaver, SettingsBackend};
pub use table::DefaultLayerTable;

/// Raw mutex used by all channels and signals of this crate
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
