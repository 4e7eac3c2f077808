//! Events consumed by the default layer engine
//!
//! Events are published through embassy-sync's `PubSubChannel`, every subscriber receives every event,
//! so handling an event here never stops it from reaching other subscribers.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::pubsub::{ImmediatePublisher, PubSubChannel, Subscriber};

use crate::endpoint::EndpointInstance;

/// Capacity of the endpoint changed event channel
pub const ENDPOINT_CHANGED_EVENT_CHANNEL_SIZE: usize = 2;
/// Max number of subscribers of the endpoint changed event channel
pub const ENDPOINT_CHANGED_EVENT_SUB_SIZE: usize = 4;
/// Max number of publishers of the endpoint changed event channel
pub const ENDPOINT_CHANGED_EVENT_PUB_SIZE: usize = 1;

/// Trait for event publishers
pub trait EventPublisher<T> {
    fn publish(&self, message: T);
}

/// Trait for event subscribers
pub trait EventSubscriber<T> {
    async fn next_event(&mut self) -> T;
}

impl<'a, M: RawMutex, T: Clone, const CAP: usize, const SUBS: usize, const PUBS: usize> EventPublisher<T>
    for ImmediatePublisher<'a, M, T, CAP, SUBS, PUBS>
{
    fn publish(&self, message: T) {
        self.publish_immediate(message);
    }
}

impl<'a, M: RawMutex, T: Clone, const CAP: usize, const SUBS: usize, const PUBS: usize> EventSubscriber<T>
    for Subscriber<'a, M, T, CAP, SUBS, PUBS>
{
    async fn next_event(&mut self) -> T {
        self.next_message_pure().await
    }
}

/// The selected output endpoint has changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointChangedEvent {
    pub endpoint: EndpointInstance,
}

impl EndpointChangedEvent {
    pub fn new(endpoint: EndpointInstance) -> Self {
        Self { endpoint }
    }
}

pub type EndpointChangedSubscriber = Subscriber<
    'static,
    crate::RawMutex,
    EndpointChangedEvent,
    ENDPOINT_CHANGED_EVENT_CHANNEL_SIZE,
    ENDPOINT_CHANGED_EVENT_SUB_SIZE,
    ENDPOINT_CHANGED_EVENT_PUB_SIZE,
>;

/// Channel for endpoint changed events
pub static ENDPOINT_CHANGED_EVENT_CHANNEL: PubSubChannel<
    crate::RawMutex,
    EndpointChangedEvent,
    ENDPOINT_CHANGED_EVENT_CHANNEL_SIZE,
    ENDPOINT_CHANGED_EVENT_SUB_SIZE,
    ENDPOINT_CHANGED_EVENT_PUB_SIZE,
> = PubSubChannel::new();

/// Publish an [`EndpointChangedEvent`], the oldest event is dropped if a subscriber lags behind
pub fn publish_endpoint_changed(event: EndpointChangedEvent) {
    ENDPOINT_CHANGED_EVENT_CHANNEL.immediate_publisher().publish(event);
}

/// Subscribe to [`EndpointChangedEvent`]s, `None` if all subscriber slots are taken
pub fn endpoint_changed_subscriber() -> Option<EndpointChangedSubscriber> {
    match ENDPOINT_CHANGED_EVENT_CHANNEL.subscriber() {
        Ok(sub) => Some(sub),
        Err(_) => {
            error!("No subscriber slot left for EndpointChangedEvent");
            None
        }
    }
}
