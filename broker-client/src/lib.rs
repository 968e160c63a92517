//! The external-collaborator boundary for `cluster-core`.
//!
//! This crate owns everything `cluster-core` treats as opaque: the
//! [`Broker`] trait a transport implementation must satisfy, the wire-level
//! value types those methods exchange, and the [`ConnectionBuilder`] factory
//! that turns seed addresses or metadata into the arguments a concrete
//! `Broker` is constructed from. Nothing here opens a socket.

mod broker;
mod connection;
mod error;
pub mod types;

pub use broker::Broker;
pub use connection::{BrokerAddr, ConnectionBuilder};
pub use error::{BrokerError, ProtocolErrorCode};
pub use types::{
    BrokerMetadata, BrokerTransportConfig, CoordinatorType, FindCoordinatorRequest,
    FindCoordinatorResponse, IsolationLevel, ListOffsetsRequest, ListOffsetsResponse,
    MetadataResponse, NodeId, OffsetPartitionDescriptor, OffsetPartitionResponse,
    PartitionMetadata, TopicMetadata, TopicOffsetsRequest, TopicOffsetsResponse,
    EARLIEST_OFFSET, LATEST_OFFSET,
};
