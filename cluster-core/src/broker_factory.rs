//! The seam between `BrokerPool` and whatever transport a caller plugs in.

use std::sync::Arc;

use broker_client::{Broker, BrokerAddr, BrokerTransportConfig};

/// Constructs a [`Broker`] bound to an address.
///
/// `ConnectionBuilder` (in `broker-client`) decides *which* address to bind
/// to; `BrokerFactory` decides *how* to turn that address into a connected
/// transport. `BrokerPool` calls `connect()` on what this returns — the
/// factory itself only builds the value, matching the "pure factory, never
/// opens a socket" contract `ConnectionBuilder` follows.
pub trait BrokerFactory: Send + Sync + std::fmt::Debug {
    fn create(&self, addr: BrokerAddr, transport: &BrokerTransportConfig) -> Arc<dyn Broker>;
}
