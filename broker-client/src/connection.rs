use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::{BrokerMetadata, BrokerTransportConfig, NodeId};

/// The address and (if known) identity a `Broker` should be constructed
/// for. Produced by [`ConnectionBuilder`]; never dialed by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddr {
    pub host: String,
    pub port: u16,
    pub node_id: Option<NodeId>,
    pub rack: Option<String>,
}

impl From<&BrokerMetadata> for BrokerAddr {
    fn from(meta: &BrokerMetadata) -> Self {
        BrokerAddr {
            host: meta.host.clone(),
            port: meta.port,
            node_id: Some(meta.node_id),
            rack: meta.rack.clone(),
        }
    }
}

/// A pure factory for broker connection arguments.
///
/// `ConnectionBuilder` never opens a socket itself: it only composes the
/// `BrokerAddr` (seed, round-robin, or discovered from a metadata snapshot)
/// and the shared [`BrokerTransportConfig`] that a concrete `Broker`
/// constructor needs. The actual `Broker::connect` call is the caller's
/// responsibility.
#[derive(Debug)]
pub struct ConnectionBuilder {
    seeds: Vec<(String, u16)>,
    next_seed: AtomicUsize,
    transport: BrokerTransportConfig,
}

impl ConnectionBuilder {
    /// Parses `host:port` seed strings. Panics on a malformed seed list,
    /// since that is a configuration error the caller should have caught
    /// before constructing a `Cluster`.
    pub fn new(seeds: &[String], transport: BrokerTransportConfig) -> Self {
        let seeds = seeds
            .iter()
            .map(|seed| {
                let (host, port) = seed
                    .rsplit_once(':')
                    .unwrap_or_else(|| panic!("invalid seed broker address: {seed}"));
                let port: u16 = port
                    .parse()
                    .unwrap_or_else(|_| panic!("invalid seed broker port: {seed}"));
                (host.to_string(), port)
            })
            .collect();
        ConnectionBuilder {
            seeds,
            next_seed: AtomicUsize::new(0),
            transport,
        }
    }

    /// The shared transport configuration every broker built by this
    /// connection builder is constructed with.
    pub fn transport(&self) -> &BrokerTransportConfig {
        &self.transport
    }

    /// Returns the next seed address in round-robin order. Used to build
    /// the bootstrap (`seedBroker`) connection.
    pub fn next_seed_addr(&self) -> BrokerAddr {
        assert!(!self.seeds.is_empty(), "no seed brokers configured");
        let i = self.next_seed.fetch_add(1, Ordering::Relaxed) % self.seeds.len();
        let (host, port) = &self.seeds[i];
        BrokerAddr {
            host: host.clone(),
            port: *port,
            node_id: None,
            rack: None,
        }
    }

    /// Builds the address for a broker discovered in cluster metadata.
    pub fn addr_for_metadata(&self, meta: &BrokerMetadata) -> BrokerAddr {
        BrokerAddr::from(meta)
    }
}
