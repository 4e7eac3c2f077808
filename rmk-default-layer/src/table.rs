use crate::endpoint::EndpointInstance;
use crate::error::DefaultLayerError;

/// Default layer of every endpoint, indexed by [`EndpointInstance::index`].
///
/// The persisted record is the raw table, one byte per endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DefaultLayerTable<const NUM_ENDPOINT: usize> {
    endpoint_defaults: [u8; NUM_ENDPOINT],
}

impl<const NUM_ENDPOINT: usize> Default for DefaultLayerTable<NUM_ENDPOINT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const NUM_ENDPOINT: usize> DefaultLayerTable<NUM_ENDPOINT> {
    /// Size of the persisted record
    pub const RECORD_SIZE: usize = NUM_ENDPOINT;

    pub const fn new() -> Self {
        Self {
            endpoint_defaults: [0; NUM_ENDPOINT],
        }
    }

    /// Parse a persisted record, the record must have exactly [`Self::RECORD_SIZE`] bytes
    pub fn from_record(record: &[u8]) -> Result<Self, DefaultLayerError> {
        let endpoint_defaults = record
            .try_into()
            .map_err(|_| DefaultLayerError::RecordSizeMismatch {
                expected: Self::RECORD_SIZE,
                actual: record.len(),
            })?;
        Ok(Self { endpoint_defaults })
    }

    /// Replace the whole table with a persisted record, the table is untouched if the record is rejected
    pub fn load(&mut self, record: &[u8]) -> Result<(), DefaultLayerError> {
        *self = Self::from_record(record)?;
        Ok(())
    }

    pub fn as_record(&self) -> &[u8] {
        &self.endpoint_defaults
    }

    /// Default layer of given endpoint, `None` if the endpoint has no slot in the table
    pub fn get(&self, endpoint: EndpointInstance) -> Option<u8> {
        self.get_by_index(endpoint.index())
    }

    /// Default layer stored at given index, `None` if the index is out of range
    pub fn get_by_index(&self, index: usize) -> Option<u8> {
        self.endpoint_defaults.get(index).copied()
    }

    /// Overwrite the default layer of given endpoint, the layer is NOT validated here
    pub(crate) fn store(&mut self, endpoint: EndpointInstance, layer: u8) -> Result<(), DefaultLayerError> {
        let slot = self
            .endpoint_defaults
            .get_mut(endpoint.index())
            .ok_or(DefaultLayerError::InvalidEndpoint(endpoint))?;
        *slot = layer;
        Ok(())
    }
}
