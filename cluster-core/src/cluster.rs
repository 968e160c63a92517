//! The public façade exposed to producer/consumer/admin layers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use broker_client::{
    Broker, ConnectionBuilder, CoordinatorType, FindCoordinatorRequest, FindCoordinatorResponse,
    IsolationLevel, ListOffsetsRequest, MetadataResponse, NodeId, OffsetPartitionDescriptor,
    PartitionMetadata, TopicOffsetsRequest, EARLIEST_OFFSET, LATEST_OFFSET,
};
use tokio::sync::RwLock;

use crate::broker_factory::BrokerFactory;
use crate::broker_pool::BrokerPool;
use crate::config::ClusterConfig;
use crate::error::ClusterError;
use crate::retry::{Bail, RetryError, Retrier};

/// One topic's worth of an offset-listing request.
#[derive(Debug, Clone)]
pub struct FetchOffsetsTopicRequest {
    pub topic: String,
    pub partitions: Vec<i32>,
    pub from_beginning: bool,
}

/// One partition's resolved offset. Carried as a decimal string: Kafka
/// offsets are 64-bit and this crate's public boundary avoids baking in an
/// assumption that every consumer of it has a lossless 64-bit integer type
/// to put it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPartitionOffset {
    pub partition: i32,
    pub offset: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOffsets {
    pub topic: String,
    pub partitions: Vec<TopicPartitionOffset>,
}

fn default_offset(from_beginning: bool) -> i64 {
    if from_beginning {
        EARLIEST_OFFSET
    } else {
        LATEST_OFFSET
    }
}

/// The cluster coordinator: connect/disconnect, metadata queries, leader
/// lookup, coordinator discovery, offset listing, and committed-offset
/// bookkeeping.
///
/// Holds no process-wide state: the broker factory, retry policy, and every
/// timeout are injected once at construction.
pub struct Cluster {
    broker_pool: Arc<BrokerPool>,
    target_topics: RwLock<HashSet<String>>,
    committed_offsets: RwLock<HashMap<String, HashMap<String, HashMap<i32, String>>>>,
    retrier: Retrier,
    isolation_level: IsolationLevel,
}

impl Cluster {
    pub fn new(config: ClusterConfig, broker_factory: Arc<dyn BrokerFactory>) -> Self {
        let connection_builder = ConnectionBuilder::new(&config.brokers, config.transport.clone());
        let broker_pool = BrokerPool::new(
            connection_builder,
            broker_factory,
            config.metadata_max_age,
            config.authentication_timeout,
        );
        Cluster {
            broker_pool,
            target_topics: RwLock::new(HashSet::new()),
            committed_offsets: RwLock::new(HashMap::new()),
            retrier: Retrier::new(config.retry),
            isolation_level: config.isolation_level,
        }
    }

    /// Materializes at least one broker and fetches an initial snapshot.
    pub async fn connect(&self) -> Result<(), ClusterError> {
        self.broker_pool.connect().await?;
        let topics = self.target_topics_vec().await;
        self.broker_pool.refresh_metadata(&topics).await?;
        Ok(())
    }

    /// Tears down all brokers and drops the cached snapshot.
    pub async fn disconnect(&self) {
        self.broker_pool.disconnect().await;
    }

    async fn target_topics_vec(&self) -> Vec<String> {
        self.target_topics.read().await.iter().cloned().collect()
    }

    pub async fn add_target_topic(&self, topic: impl Into<String>) -> Result<(), ClusterError> {
        self.add_multiple_target_topics(std::iter::once(topic.into())).await
    }

    pub async fn add_multiple_target_topics<I>(&self, topics: I) -> Result<(), ClusterError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut changed = false;
        {
            let mut target = self.target_topics.write().await;
            for topic in topics {
                changed |= target.insert(topic);
            }
        }
        let snapshot_absent = self.broker_pool.current_metadata().await.is_none();
        if changed || snapshot_absent {
            let topics = self.target_topics_vec().await;
            self.broker_pool.refresh_metadata(&topics).await?;
        }
        Ok(())
    }

    /// Asks a broker for a metadata response covering `topics`, refreshing
    /// the internal snapshot first if it looks stale. `LEADER_NOT_AVAILABLE`
    /// is retried; every other error bails immediately.
    pub async fn metadata(&self, topics: &[String]) -> Result<MetadataResponse, ClusterError> {
        self.retrier
            .retry(|_state| async {
                match self.metadata_attempt(topics).await {
                    Ok(response) => Ok(response),
                    Err(e) if e.is_leader_not_available() => Err(Bail::Retry(e)),
                    Err(e) => Err(Bail::Bail(e)),
                }
            })
            .await
            .map_err(RetryError::into_inner)
    }

    async fn metadata_attempt(&self, topics: &[String]) -> Result<MetadataResponse, ClusterError> {
        self.broker_pool.refresh_metadata_if_necessary(topics).await?;
        self.broker_pool
            .with_broker(|_node_id, broker| async move {
                broker.metadata(topics).await.map_err(ClusterError::from)
            })
            .await
    }

    /// Delegates to `BrokerPool::find_broker`. On `BrokerNotFound`,
    /// `LockTimeout`, or a connection refusal, triggers a metadata refresh
    /// before surfacing the error, so the caller's retry sees fresh
    /// topology.
    pub async fn find_broker(&self, node_id: NodeId) -> Result<Arc<dyn Broker>, ClusterError> {
        match self.broker_pool.find_broker(node_id).await {
            Ok(broker) => Ok(broker),
            Err(e) if e.triggers_metadata_refresh() => {
                let topics = self.target_topics_vec().await;
                let _ = self.broker_pool.refresh_metadata(&topics).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_controller_broker(&self) -> Result<Arc<dyn Broker>, ClusterError> {
        let snapshot = self
            .broker_pool
            .current_metadata()
            .await
            .ok_or(ClusterError::MetadataNotLoaded)?;
        let controller_id = snapshot.controller_id.ok_or(ClusterError::MetadataNotLoaded)?;
        self.find_broker(controller_id).await
    }

    pub async fn find_topic_partition_metadata(
        &self,
        topic: &str,
    ) -> Result<Vec<PartitionMetadata>, ClusterError> {
        let snapshot = self
            .broker_pool
            .current_metadata()
            .await
            .ok_or_else(|| ClusterError::TopicMetadataNotLoaded(topic.to_string()))?;
        Ok(snapshot
            .topic(topic)
            .map(|t| t.partitions.clone())
            .unwrap_or_default())
    }

    /// Groups `partitions` by their current leader. Partitions with no
    /// metadata are silently omitted; a partition whose metadata exists but
    /// whose leader is null fails `InvalidPartitionMetadata` (the cluster is
    /// mid-transition — see DESIGN.md for why this asymmetry is preserved).
    pub async fn find_leader_for_partitions(
        &self,
        topic: &str,
        partitions: &[i32],
    ) -> Result<HashMap<NodeId, Vec<i32>>, ClusterError> {
        let snapshot = self
            .broker_pool
            .current_metadata()
            .await
            .ok_or_else(|| ClusterError::TopicMetadataNotLoaded(topic.to_string()))?;
        let mut grouped: HashMap<NodeId, Vec<i32>> = HashMap::new();
        for &partition in partitions {
            let Some(meta) = snapshot.partition(topic, partition) else {
                continue;
            };
            let leader = meta.leader.ok_or_else(|| ClusterError::InvalidPartitionMetadata {
                topic: topic.to_string(),
                partition,
            })?;
            grouped.entry(leader).or_default().push(partition);
        }
        Ok(grouped)
    }

    /// Inner retry: retries only on `GROUP_COORDINATOR_NOT_AVAILABLE`,
    /// bails every other error, and fails `GroupCoordinatorNotFound` once
    /// its retry budget is exhausted.
    pub async fn find_group_coordinator_metadata(
        &self,
        group_id: &str,
        coordinator_type: CoordinatorType,
    ) -> Result<FindCoordinatorResponse, ClusterError> {
        self.retrier
            .retry(|_state| async {
                let attempt = self
                    .broker_pool
                    .with_broker(|_node_id, broker| async move {
                        broker
                            .find_group_coordinator(FindCoordinatorRequest {
                                group_id: group_id.to_string(),
                                coordinator_type,
                            })
                            .await
                            .map_err(ClusterError::from)
                    })
                    .await;
                match attempt {
                    Ok(response) => Ok(response),
                    Err(e) if e.is_group_coordinator_not_available() => Err(Bail::Retry(e)),
                    Err(e) => Err(Bail::Bail(e)),
                }
            })
            .await
            .map_err(|e| match e {
                RetryError::Exhausted(_) => ClusterError::GroupCoordinatorNotFound,
                RetryError::Bailed(e) => e,
            })
    }

    /// Outer retry: learns the coordinator's node id, then resolves a
    /// broker for it. On `BrokerNotFound`, `GROUP_COORDINATOR_NOT_AVAILABLE`,
    /// or a connection refusal, refreshes metadata and retries; other
    /// errors bail.
    pub async fn find_group_coordinator(
        &self,
        group_id: &str,
        coordinator_type: CoordinatorType,
    ) -> Result<Arc<dyn Broker>, ClusterError> {
        self.retrier
            .retry(|_state| async {
                match self.find_group_coordinator_attempt(group_id, coordinator_type).await {
                    Ok(broker) => Ok(broker),
                    Err(e) if e.triggers_metadata_refresh() || e.is_group_coordinator_not_available() => {
                        let topics = self.target_topics_vec().await;
                        let _ = self.broker_pool.refresh_metadata(&topics).await;
                        Err(Bail::Retry(e))
                    }
                    Err(e) => Err(Bail::Bail(e)),
                }
            })
            .await
            .map_err(RetryError::into_inner)
    }

    /// Resolves the coordinator's broker directly through `BrokerPool`,
    /// bypassing `Cluster::find_broker`'s own refresh-and-rethrow. The outer
    /// retry in `find_group_coordinator` already refreshes metadata for the
    /// same error classes (`triggers_metadata_refresh`/
    /// `is_group_coordinator_not_available`) before retrying, so going
    /// through `find_broker` here would refresh twice for one failure.
    async fn find_group_coordinator_attempt(
        &self,
        group_id: &str,
        coordinator_type: CoordinatorType,
    ) -> Result<Arc<dyn Broker>, ClusterError> {
        let coordinator = self.find_group_coordinator_metadata(group_id, coordinator_type).await?;
        self.broker_pool
            .find_broker(coordinator.coordinator.node_id)
            .await
    }

    /// Resolves leaders for every requested topic, fans one `listOffsets`
    /// call out per leader concurrently, and merges the results. Failure of
    /// any single leader's request aborts the whole operation — there is no
    /// partial result.
    #[tracing::instrument(skip(self, requests))]
    pub async fn fetch_topics_offset(
        &self,
        requests: Vec<FetchOffsetsTopicRequest>,
    ) -> Result<Vec<TopicOffsets>, ClusterError> {
        let mut by_node: HashMap<NodeId, HashMap<String, Vec<OffsetPartitionDescriptor>>> = HashMap::new();
        for request in &requests {
            let leaders = self
                .find_leader_for_partitions(&request.topic, &request.partitions)
                .await?;
            let timestamp = default_offset(request.from_beginning);
            for (node_id, partitions) in leaders {
                let descriptors: Vec<OffsetPartitionDescriptor> = partitions
                    .into_iter()
                    .map(|partition| OffsetPartitionDescriptor { partition, timestamp })
                    .collect();
                by_node
                    .entry(node_id)
                    .or_default()
                    .entry(request.topic.clone())
                    .or_insert_with(Vec::new)
                    .extend(descriptors);
            }
        }

        let isolation_level = self.isolation_level;
        let leader_requests = by_node.into_iter().map(|(node_id, topics)| {
            let topics: Vec<TopicOffsetsRequest> = topics
                .into_iter()
                .map(|(topic, partitions)| TopicOffsetsRequest { topic, partitions })
                .collect();
            async move {
                let broker = self.find_broker(node_id).await?;
                broker
                    .list_offsets(ListOffsetsRequest {
                        isolation_level,
                        topics,
                    })
                    .await
                    .map_err(ClusterError::from)
            }
        });
        let responses = futures::future::try_join_all(leader_requests).await?;

        let mut merged: HashMap<String, Vec<TopicPartitionOffset>> = HashMap::new();
        for response in responses {
            for topic_response in response.responses {
                let entry = merged.entry(topic_response.topic).or_default();
                for partition in topic_response.partitions {
                    entry.push(TopicPartitionOffset {
                        partition: partition.partition,
                        offset: partition.offset.to_string(),
                    });
                }
            }
        }
        Ok(merged
            .into_iter()
            .map(|(topic, partitions)| TopicOffsets { topic, partitions })
            .collect())
    }

    /// Reads this group's committed-offset map, lazily initializing it on
    /// first access. Pure in-memory bookkeeping; never read back from a
    /// broker.
    pub async fn committed_offsets(&self, group_id: &str) -> HashMap<String, HashMap<i32, String>> {
        let mut offsets = self.committed_offsets.write().await;
        offsets.entry(group_id.to_string()).or_default().clone()
    }

    pub async fn mark_offset_as_committed(
        &self,
        group_id: &str,
        topic: &str,
        partition: i32,
        offset: String,
    ) {
        let mut offsets = self.committed_offsets.write().await;
        offsets
            .entry(group_id.to_string())
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .insert(partition, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_sentinel_mapping() {
        assert_eq!(default_offset(true), EARLIEST_OFFSET);
        assert_eq!(default_offset(false), LATEST_OFFSET);
    }
}
