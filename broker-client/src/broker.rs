use async_trait::async_trait;

use crate::error::BrokerError;
use crate::types::{
    FindCoordinatorRequest, FindCoordinatorResponse, ListOffsetsRequest, ListOffsetsResponse,
    MetadataResponse, NodeId,
};

/// A single connection to a Kafka broker.
///
/// This is the opaque collaborator `cluster-core` is built against: framing,
/// serialization, and the TLS/SASL handshake all live below this trait, in
/// whatever concrete transport a caller plugs in. `cluster-core` only ever
/// reaches a `Broker` through an `Arc<dyn Broker>` handed to it by
/// `BrokerPool`.
#[async_trait]
pub trait Broker: Send + Sync + std::fmt::Debug {
    /// The node id this broker is bound to, once known. A broker built from
    /// a seed address before its first metadata refresh may not know its
    /// own node id yet.
    fn node_id(&self) -> Option<NodeId>;

    /// True iff the broker's socket is currently connected.
    fn is_connected(&self) -> bool;

    /// Opens the underlying connection. Idempotent: calling `connect` on an
    /// already-connected broker is a no-op.
    async fn connect(&self) -> Result<(), BrokerError>;

    /// Tears down the underlying connection. Idempotent.
    async fn disconnect(&self);

    /// Fetches metadata for the given topics (all topics, if empty).
    async fn metadata(&self, topics: &[String]) -> Result<MetadataResponse, BrokerError>;

    /// Asks this broker which node coordinates the given group or
    /// transactional id.
    async fn find_group_coordinator(
        &self,
        request: FindCoordinatorRequest,
    ) -> Result<FindCoordinatorResponse, BrokerError>;

    /// Issues a `ListOffsets` request. The caller is expected to have
    /// already resolved which broker leads each partition being asked
    /// about; this method does not redirect on `NOT_LEADER`.
    async fn list_offsets(
        &self,
        request: ListOffsetsRequest,
    ) -> Result<ListOffsetsResponse, BrokerError>;
}
