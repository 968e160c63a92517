//! Wire-level value types exchanged with a [`crate::Broker`].
//!
//! These mirror the shapes named in the cluster metadata data model: they
//! are what a real codec would hand back after parsing a `Metadata`,
//! `FindCoordinator`, or `ListOffsets` response off the wire.

use serde::{Deserialize, Serialize};

/// A Kafka broker/node id. Signed on the wire.
pub type NodeId = i32;

/// Sentinel offset meaning "start of the partition".
pub const EARLIEST_OFFSET: i64 = -2;
/// Sentinel offset meaning "end of the partition".
pub const LATEST_OFFSET: i64 = -1;

/// One broker entry from a metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerMetadata {
    pub node_id: NodeId,
    pub host: String,
    pub port: u16,
    pub rack: Option<String>,
}

/// One partition entry from a metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMetadata {
    pub partition_id: i32,
    /// Absent when the partition is between leaders.
    pub leader: Option<NodeId>,
    pub replicas: Vec<NodeId>,
    pub isr: Vec<NodeId>,
    pub partition_error_code: i16,
}

/// One topic entry from a metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub topic: String,
    pub topic_error_code: i16,
    pub partitions: Vec<PartitionMetadata>,
}

/// The raw response of a `Broker::metadata` call, before `BrokerPool`
/// stamps it with a `fetched_at` timestamp and turns it into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub controller_id: Option<NodeId>,
    pub brokers: Vec<BrokerMetadata>,
    pub topics: Vec<TopicMetadata>,
}

/// `GROUP` (0) or `TRANSACTION` (1), per the Kafka wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum CoordinatorType {
    Group = 0,
    Transaction = 1,
}

/// `READ_UNCOMMITTED` (0) or `READ_COMMITTED` (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum IsolationLevel {
    ReadUncommitted = 0,
    ReadCommitted = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCoordinatorRequest {
    pub group_id: String,
    pub coordinator_type: CoordinatorType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCoordinatorResponse {
    pub host: String,
    pub coordinator: BrokerMetadata,
}

/// One partition a `ListOffsets` request asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPartitionDescriptor {
    pub partition: i32,
    /// `EARLIEST_OFFSET`, `LATEST_OFFSET`, or a concrete timestamp.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOffsetsRequest {
    pub topic: String,
    pub partitions: Vec<OffsetPartitionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOffsetsRequest {
    pub isolation_level: IsolationLevel,
    pub topics: Vec<TopicOffsetsRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPartitionResponse {
    pub partition: i32,
    pub offset: i64,
    pub error_code: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOffsetsResponse {
    pub topic: String,
    pub partitions: Vec<OffsetPartitionResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOffsetsResponse {
    pub responses: Vec<TopicOffsetsResponse>,
}

/// Transport credentials and timeouts, opaque to everything above the
/// `Broker` boundary. `ssl`/`sasl` are left as serialized blobs since this
/// crate does not implement a transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerTransportConfig {
    pub client_id: Option<String>,
    pub ssl: Option<serde_json::Value>,
    pub sasl: Option<serde_json::Value>,
    pub connection_timeout_ms: Option<u64>,
    pub authentication_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub enforce_request_timeout: bool,
}
