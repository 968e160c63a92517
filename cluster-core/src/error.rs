use broker_client::{BrokerError, NodeId, ProtocolErrorCode};
use thiserror::Error;

/// The error taxonomy `Cluster` and `BrokerPool` operations raise.
///
/// Every variant here corresponds to one of the "kinds, not class names" in
/// the failure taxonomy: callers match on the variant, not on a message
/// string, to decide whether to retry, refresh, or give up.
#[derive(Error, Debug, Clone)]
pub enum ClusterError {
    #[error("cluster metadata has not been loaded")]
    MetadataNotLoaded,

    #[error("topic metadata for `{0}` has not been loaded")]
    TopicMetadataNotLoaded(String),

    #[error("no broker found for node id {0}")]
    BrokerNotFound(NodeId),

    #[error("no connected broker is available")]
    BrokerNotConnected,

    #[error("group coordinator discovery exhausted its retries")]
    GroupCoordinatorNotFound,

    #[error("timed out waiting for a connection lock on node {0}")]
    LockTimeout(NodeId),

    #[error("partition {partition} of `{topic}` has no leader")]
    InvalidPartitionMetadata { topic: String, partition: i32 },

    #[error(transparent)]
    Protocol(#[from] ProtocolErrorCode),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Bypasses retry entirely. Raised today only by
    /// [`crate::subscription::SubscriptionState::resume`] for the
    /// selective-resume-after-pause-all case, but kept as a general escape
    /// hatch for any future caller that needs to signal "do not retry this,
    /// it will never succeed".
    #[error("non-retriable error: {0}")]
    NonRetriable(String),
}

impl ClusterError {
    /// True for the errors that should trigger a metadata refresh before
    /// being rethrown to the caller: `BrokerNotFound`, `LockTimeout`, and a
    /// connection refusal.
    pub fn triggers_metadata_refresh(&self) -> bool {
        match self {
            ClusterError::BrokerNotFound(_) | ClusterError::LockTimeout(_) => true,
            ClusterError::Broker(e) => e.is_connection_refused(),
            _ => false,
        }
    }

    /// True for `LEADER_NOT_AVAILABLE`, which `Cluster::metadata` retries
    /// rather than bails on.
    pub fn is_leader_not_available(&self) -> bool {
        matches!(self, ClusterError::Protocol(ProtocolErrorCode::LeaderNotAvailable))
            || matches!(
                self,
                ClusterError::Broker(BrokerError::Protocol(ProtocolErrorCode::LeaderNotAvailable))
            )
    }

    /// True for `GROUP_COORDINATOR_NOT_AVAILABLE`, which coordinator
    /// discovery retries.
    pub fn is_group_coordinator_not_available(&self) -> bool {
        matches!(
            self,
            ClusterError::Protocol(ProtocolErrorCode::GroupCoordinatorNotAvailable)
        ) || matches!(
            self,
            ClusterError::Broker(BrokerError::Protocol(
                ProtocolErrorCode::GroupCoordinatorNotAvailable
            ))
        )
    }
}
