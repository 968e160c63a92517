use std::time::Duration;

use thiserror::Error;

/// Protocol-coded errors a broker can reply with. Only the codes the
/// coordination core makes retry/refresh decisions on are enumerated by
/// name; anything else rides in [`ProtocolErrorCode::Other`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorCode {
    #[error("LEADER_NOT_AVAILABLE")]
    LeaderNotAvailable,
    #[error("GROUP_COORDINATOR_NOT_AVAILABLE")]
    GroupCoordinatorNotAvailable,
    #[error("protocol error code {0}")]
    Other(i16),
}

impl ProtocolErrorCode {
    /// Maps a Kafka wire error code to its typed form. Codes without a
    /// named variant fall back to [`ProtocolErrorCode::Other`].
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => None,
            5 => Some(Self::LeaderNotAvailable),
            15 => Some(Self::GroupCoordinatorNotAvailable),
            other => Some(Self::Other(other)),
        }
    }
}

/// Transport-level failures a [`crate::Broker`] implementation raises.
/// These are intentionally coarse: the wire codec and socket layer are out
/// of scope for this crate, so a real implementation collapses whatever
/// lower-level errors it has into one of these variants.
#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    #[error("connection refused to {0}")]
    ConnectionRefused(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolErrorCode),
}

impl BrokerError {
    /// True for failures that look like the broker is simply unreachable,
    /// as opposed to a protocol-level response. `cluster-core` uses this to
    /// decide whether to fall back to the seed broker or trigger a
    /// metadata refresh.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, BrokerError::ConnectionRefused(_))
    }
}
