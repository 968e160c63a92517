use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use broker_client::{Broker, BrokerAddr, BrokerTransportConfig, NodeId};
use cluster_core::BrokerFactory;

use super::mock_broker::MockBroker;

/// Hands out a fixed seed broker for the bootstrap address, and
/// pre-registered brokers for every node id discovered afterwards.
#[derive(Debug)]
pub struct MockBrokerFactory {
    seed: Arc<MockBroker>,
    brokers: Mutex<HashMap<NodeId, Arc<MockBroker>>>,
}

impl MockBrokerFactory {
    pub fn new(seed: Arc<MockBroker>) -> Self {
        MockBrokerFactory {
            seed,
            brokers: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, node_id: NodeId, broker: Arc<MockBroker>) {
        self.brokers.lock().unwrap().insert(node_id, broker);
    }
}

impl BrokerFactory for MockBrokerFactory {
    fn create(&self, addr: BrokerAddr, _transport: &BrokerTransportConfig) -> Arc<dyn Broker> {
        match addr.node_id {
            Some(node_id) => match self.brokers.lock().unwrap().get(&node_id) {
                Some(broker) => Arc::clone(broker) as Arc<dyn Broker>,
                None => panic!("no mock broker registered for node {node_id}"),
            },
            None => Arc::clone(&self.seed) as Arc<dyn Broker>,
        }
    }
}
