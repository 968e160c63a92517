//! Cluster coordination core for a Kafka wire-protocol client.
//!
//! This crate owns topology discovery, broker connection lifecycle,
//! retry-with-backoff, and consumer pause/resume bookkeeping. It never opens
//! a socket or speaks the wire protocol itself: those live behind the
//! [`broker_client::Broker`] trait, supplied by a caller-provided
//! [`BrokerFactory`].

mod broker_factory;
mod broker_pool;
mod cluster;
mod config;
mod error;
mod metadata;
mod retry;
mod subscription;

pub use broker_client::{
    Broker, BrokerError, BrokerMetadata, BrokerTransportConfig, CoordinatorType,
    FindCoordinatorRequest, FindCoordinatorResponse, IsolationLevel, ListOffsetsRequest,
    ListOffsetsResponse, MetadataResponse, NodeId, PartitionMetadata, ProtocolErrorCode,
    TopicMetadata, EARLIEST_OFFSET, LATEST_OFFSET,
};

pub use broker_factory::BrokerFactory;
pub use broker_pool::BrokerPool;
pub use cluster::{Cluster, FetchOffsetsTopicRequest, TopicOffsets, TopicPartitionOffset};
pub use config::{ClusterConfig, ClusterConfigFile};
pub use error::ClusterError;
pub use metadata::ClusterMetadataSnapshot;
pub use retry::{Bail, RetryConfig, RetryError, RetryState, Retrier};
pub use subscription::{PauseEntry, PausedTopic, SubscriptionState};
