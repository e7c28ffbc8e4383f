//! The EdgeHub controller: a reconnect-aware session manager that owns the cloud
//! transport, routes messages between it and the local module bus, tracks synchronous
//! request/response correlation, emits heartbeats, and publishes connection-state
//! events.

mod bus;
mod config;
mod controller;
mod correlation;
mod dispatcher;
mod message;
mod placement;
mod registry;
mod transport;

pub use bus::{BusError, MessageBus};
pub use config::{ControllerConfig, GroupMap};
pub use controller::{FatalError, SessionController};
pub use correlation::CorrelationTable;
pub use dispatcher::{DispatchError, dispatch};
pub use message::{
    CLOUD_CONNECTED, CLOUD_DISCONNECTED, CONNECTION_OPERATION, CONNECTION_RESOURCE,
    CONNECTION_SOURCE, EDGEHUB_MODULE, Message, MessageId,
};
pub use placement::{PlacementError, PlacementResolver};
pub use registry::ModuleRegistry;
pub use transport::{TransportAdapter, TransportError, TransportFactory};
