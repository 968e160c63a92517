//! The cluster metadata snapshot: the cached view of brokers, topics, and
//! partition leadership installed by the last `BrokerPool::refresh_metadata`.

use std::time::Instant;

use broker_client::{BrokerMetadata, MetadataResponse, NodeId, PartitionMetadata, TopicMetadata};

/// An immutable point-in-time view of cluster topology.
///
/// Replaced wholesale on every refresh and handed out behind an `Arc`, so
/// readers that capture the pointer once per operation never observe a torn
/// mix of an old and new snapshot.
#[derive(Debug, Clone)]
pub struct ClusterMetadataSnapshot {
    pub controller_id: Option<NodeId>,
    pub brokers: Vec<BrokerMetadata>,
    pub topics: Vec<TopicMetadata>,
    pub fetched_at: Instant,
}

impl ClusterMetadataSnapshot {
    pub fn from_response(response: MetadataResponse, fetched_at: Instant) -> Self {
        ClusterMetadataSnapshot {
            controller_id: response.controller_id,
            brokers: response.brokers,
            topics: response.topics,
            fetched_at,
        }
    }

    pub fn broker(&self, node_id: NodeId) -> Option<&BrokerMetadata> {
        self.brokers.iter().find(|b| b.node_id == node_id)
    }

    pub fn topic(&self, topic: &str) -> Option<&TopicMetadata> {
        self.topics.iter().find(|t| t.topic == topic)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topic(topic).is_some()
    }

    pub fn partition(&self, topic: &str, partition_id: i32) -> Option<&PartitionMetadata> {
        self.topic(topic)?
            .partitions
            .iter()
            .find(|p| p.partition_id == partition_id)
    }
}
