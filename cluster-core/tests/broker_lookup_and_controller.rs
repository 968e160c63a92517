//! `find_broker` stale-metadata recovery and controller lookup
//! (spec.md §8 S4, S6).

mod support;

use std::sync::Arc;
use std::time::Duration;

use broker_client::MetadataResponse;
use cluster_core::{BrokerFactory, Cluster, ClusterConfig, ClusterError, RetryConfig};

use support::fixtures::two_broker_metadata;
use support::mock_broker::MockBroker;
use support::mock_factory::MockBrokerFactory;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        initial_retry_time: Duration::from_millis(1),
        max_retry_time: Duration::from_millis(5),
        factor: 1.0,
        multiplier: 1.0,
        retries: 3,
    }
}

async fn cluster_with(factory: Arc<MockBrokerFactory>) -> Cluster {
    let mut config = ClusterConfig::new(vec!["127.0.0.1:9092".to_string()]);
    config.retry = fast_retry();
    let cluster = Cluster::new(config, factory as Arc<dyn BrokerFactory>);
    cluster.connect().await.unwrap();
    cluster
}

#[tokio::test]
async fn s4_find_broker_for_unknown_node_refreshes_metadata_before_failing() {
    let seed = Arc::new(MockBroker::new(None));
    seed.push_metadata(Ok(two_broker_metadata("t")));
    let factory = Arc::new(MockBrokerFactory::new(Arc::clone(&seed)));
    let cluster = cluster_with(factory).await;

    assert_eq!(seed.metadata_call_count(), 1);
    let err = cluster.find_broker(5).await.unwrap_err();
    assert!(matches!(err, ClusterError::BrokerNotFound(5)));
    // A refresh was triggered exactly once before the error surfaced.
    assert_eq!(seed.metadata_call_count(), 2);
}

#[tokio::test]
async fn s6_controller_lookup_fails_without_touching_the_network_when_controller_is_null() {
    let seed = Arc::new(MockBroker::new(None));
    seed.push_metadata(Ok(MetadataResponse {
        controller_id: None,
        brokers: vec![],
        topics: vec![],
    }));
    let factory = Arc::new(MockBrokerFactory::new(Arc::clone(&seed)));
    let cluster = cluster_with(factory).await;

    let calls_before = seed.metadata_call_count();
    let err = cluster.find_controller_broker().await.unwrap_err();
    assert!(matches!(err, ClusterError::MetadataNotLoaded));
    assert_eq!(seed.metadata_call_count(), calls_before);
}

#[tokio::test]
async fn controller_lookup_resolves_the_controller_broker() {
    let seed = Arc::new(MockBroker::new(None));
    seed.push_metadata(Ok(two_broker_metadata("t")));
    let factory = Arc::new(MockBrokerFactory::new(Arc::clone(&seed)));
    let node1 = Arc::new(MockBroker::new(Some(1)));
    factory.register(1, Arc::clone(&node1));
    let cluster = cluster_with(factory).await;

    // `two_broker_metadata` names node 1 as the controller.
    let broker = cluster.find_controller_broker().await.unwrap();
    assert_eq!(broker.node_id(), Some(1));
}
