//! Per-endpoint default layers
//!
//! Every endpoint remembers its own default layer. When the default layer of an endpoint changes, or another
//! endpoint is selected, the other configured default layers are deactivated and the default layer of the
//! endpoint is activated. The table is saved after a debounce interval by [`DefaultLayerSaver`](crate::DefaultLayerSaver).

use embassy_futures::select::{Either, select};

use crate::behavior::{BehaviorOutcome, DEFAULT_LAYER_COMMAND_CHANNEL, DefaultLayerBinding, DefaultLayerCommand, next_default_layer};
use crate::config::DefaultLayerConfig;
use crate::endpoint::{EndpointInstance, EndpointSelector};
use crate::error::DefaultLayerError;
use crate::event::{EndpointChangedEvent, EventSubscriber, endpoint_changed_subscriber};
use crate::layer::LayerEngine;
use crate::storage::{DEFAULT_LAYER_SETTINGS_KEY, DefaultLayerSaveSignal, SettingsBackend};
use crate::table::DefaultLayerTable;

/// Owner of the default layer table.
///
/// - `E`: the keymap whose layers are activated
/// - `P`: source of the selected endpoint
/// - `NUM_ENDPOINT`: number of endpoints, 1 USB + number of BLE profiles
/// - `NUM_LAYER`: number of layers in the keymap
pub struct DefaultLayerManager<'a, E: LayerEngine, P: EndpointSelector, const NUM_ENDPOINT: usize, const NUM_LAYER: usize>
{
    table: DefaultLayerTable<NUM_ENDPOINT>,
    config: DefaultLayerConfig,
    layers: E,
    endpoints: P,
    save_signal: &'a DefaultLayerSaveSignal<NUM_ENDPOINT>,
}

impl<'a, E: LayerEngine, P: EndpointSelector, const NUM_ENDPOINT: usize, const NUM_LAYER: usize>
    DefaultLayerManager<'a, E, P, NUM_ENDPOINT, NUM_LAYER>
{
    pub fn new(
        config: DefaultLayerConfig,
        layers: E,
        endpoints: P,
        save_signal: &'a DefaultLayerSaveSignal<NUM_ENDPOINT>,
    ) -> Self {
        config.validate::<NUM_LAYER>();
        Self {
            table: DefaultLayerTable::new(),
            config,
            layers,
            endpoints,
            save_signal,
        }
    }

    /// Load the saved table, then apply the default layer of the selected endpoint
    pub async fn init<S: SettingsBackend>(&mut self, backend: &mut S) -> Result<(), DefaultLayerError> {
        self.load(backend).await;
        self.apply(self.endpoints.selected())
    }

    /// Load the saved table.
    ///
    /// A missing, unreadable or malformed record leaves the table unchanged.
    pub async fn load<S: SettingsBackend>(&mut self, backend: &mut S) {
        let mut buf = [0_u8; NUM_ENDPOINT];
        let result = match backend.load(DEFAULT_LAYER_SETTINGS_KEY, &mut buf).await {
            Ok(Some(len)) if len <= buf.len() => self.table.load(&buf[..len]),
            Ok(Some(len)) => Err(DefaultLayerError::RecordSizeMismatch {
                expected: DefaultLayerTable::<NUM_ENDPOINT>::RECORD_SIZE,
                actual: len,
            }),
            Ok(None) => {
                info!("No saved default layers");
                return;
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                error!("Failed to read default layers: {:?}", defmt::Debug2Format(&_e));
                #[cfg(not(feature = "defmt"))]
                error!("Failed to read default layers: {:?}", _e);
                return;
            }
        };

        match result {
            Ok(()) => info!("Loaded default layers: {:?}", self.table),
            Err(e) => warn!("Ignoring saved default layers: {:?}", e),
        }
    }

    pub fn table(&self) -> &DefaultLayerTable<NUM_ENDPOINT> {
        &self.table
    }

    /// Default layer of given endpoint, `None` if the endpoint has no slot in the table
    pub fn get(&self, endpoint: EndpointInstance) -> Option<u8> {
        self.table.get(endpoint)
    }

    /// Default layer of the selected endpoint
    pub fn get_current(&self) -> Option<u8> {
        self.get(self.endpoints.selected())
    }

    /// Set the default layer of given endpoint.
    ///
    /// The layer must be a valid layer in the configured range. The default layer is applied immediately,
    /// the table is saved later. If applying fails, the new value is kept but not saved.
    pub fn set(&mut self, endpoint: EndpointInstance, layer: u8) -> Result<(), DefaultLayerError> {
        if layer as usize >= NUM_LAYER || !self.config.contains(layer) {
            warn!(
                "Layer {} can't be used as default layer, allowed range is {}..={}",
                layer, self.config.min_index, self.config.max_index
            );
            return Err(DefaultLayerError::InvalidLayer(layer));
        }

        self.table.store(endpoint, layer).inspect_err(|_| {
            warn!("No default layer slot for {}, {} endpoints supported", endpoint, NUM_ENDPOINT);
        })?;
        info!("Updated default layer ({}) for {}", layer, endpoint);

        self.apply(endpoint)?;

        // Replaces the pending table if a save is already scheduled
        self.save_signal.signal(self.table);
        Ok(())
    }

    /// Activate the default layer of given endpoint, and deactivate other default layers.
    ///
    /// The global default layer of the keymap is never touched. Failing to deactivate a layer is not fatal.
    /// Nothing is changed if the layer engine can't report its global default layer.
    pub fn apply(&mut self, endpoint: EndpointInstance) -> Result<(), DefaultLayerError> {
        let layer = self.table.get(endpoint).ok_or_else(|| {
            warn!("No default layer slot for {}, {} endpoints supported", endpoint, NUM_ENDPOINT);
            DefaultLayerError::InvalidEndpoint(endpoint)
        })?;
        let global_default_layer = self.layers.default_layer().map_err(|e| {
            warn!("Failed to get global default layer, skip applying default layer for {}: {:?}", endpoint, e);
            DefaultLayerError::LayerEngine(e)
        })?;

        // Deactivate other layers first
        for i in self.config.min_index..=self.config.max_index {
            if i != layer && i != global_default_layer {
                if let Err(e) = self.layers.deactivate_layer(i) {
                    warn!("Failed to deactivate layer {} for {}: {:?}", i, endpoint, e);
                }
            }
        }

        if layer != global_default_layer {
            if let Err(e) = self.layers.activate_layer(layer) {
                warn!(
                    "Could not apply default layer {} for {}: {:?}. Perhaps the keymap changed since it was saved",
                    layer, endpoint, e
                );
                return Err(DefaultLayerError::ActivationFailed(layer));
            }
            info!("Activated default layer ({}) for {}", layer, endpoint);
        }

        Ok(())
    }

    /// Run a default layer command for the selected endpoint.
    ///
    /// `Next` moves to the following layer, and wraps to `min_index` after `max_index`.
    /// A current layer below `min_index` (e.g. a fresh table) also moves to `min_index`.
    pub fn process_command(&mut self, command: DefaultLayerCommand) -> Result<(), DefaultLayerError> {
        let endpoint = self.endpoints.selected();
        match command {
            DefaultLayerCommand::Select(layer) => self.set(endpoint, layer),
            DefaultLayerCommand::Next => {
                let current = self
                    .table
                    .get(endpoint)
                    .ok_or(DefaultLayerError::InvalidEndpoint(endpoint))?;
                let next = next_default_layer(current, self.config.min_index, self.config.max_index);
                self.set(endpoint, next)
            }
        }
    }

    /// A key bound to the default layer behavior is pressed.
    ///
    /// Unknown commands are ignored.
    pub fn on_binding_pressed(&mut self, binding: DefaultLayerBinding) -> Result<BehaviorOutcome, DefaultLayerError> {
        match binding.command() {
            Some(command) => self.process_command(command)?,
            None => error!("Unknown command for default layer: {}", binding.param1),
        }
        Ok(BehaviorOutcome::Opaque)
    }

    /// A key bound to the default layer behavior is released, nothing to do
    pub fn on_binding_released(&mut self, _binding: DefaultLayerBinding) -> BehaviorOutcome {
        BehaviorOutcome::Opaque
    }

    /// The selected endpoint changed, apply its default layer.
    ///
    /// The table is not changed and nothing is saved.
    pub fn on_endpoint_changed_event(&mut self, event: EndpointChangedEvent) {
        debug!("Endpoint changed to {}", event.endpoint);
        if let Err(e) = self.apply(event.endpoint) {
            warn!("Failed to apply default layer for {}: {:?}", event.endpoint, e);
        }
    }

    /// Process default layer bindings from [`DEFAULT_LAYER_COMMAND_CHANNEL`] and endpoint changed events
    pub async fn run(&mut self) -> ! {
        let Some(mut endpoint_sub) = endpoint_changed_subscriber() else {
            // Bindings still work without endpoint changed events
            loop {
                let binding = DEFAULT_LAYER_COMMAND_CHANNEL.receive().await;
                self.handle_binding(binding);
            }
        };

        loop {
            match select(DEFAULT_LAYER_COMMAND_CHANNEL.receive(), endpoint_sub.next_event()).await {
                Either::First(binding) => self.handle_binding(binding),
                Either::Second(event) => self.on_endpoint_changed_event(event),
            }
        }
    }

    fn handle_binding(&mut self, binding: DefaultLayerBinding) {
        if let Err(e) = self.on_binding_pressed(binding) {
            warn!("Default layer binding {:?} failed: {:?}", binding, e);
        }
    }
}
