//! Construction-time configuration for a [`crate::Cluster`].
//!
//! Everything a collaborator needs — socket factory, retry policy, logger —
//! is injected here rather than reached for as process-wide state.

use std::time::Duration;

use broker_client::{BrokerTransportConfig, IsolationLevel};
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Construction-time configuration for a [`crate::Cluster`].
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// `host:port` seed addresses used to bootstrap the broker pool.
    pub brokers: Vec<String>,
    pub transport: BrokerTransportConfig,
    /// How long a cached metadata snapshot is trusted before
    /// `refreshMetadataIfNecessary` forces a refresh.
    pub metadata_max_age: Duration,
    /// How long a waiter on a per-node connect lock will wait before
    /// failing with `LockTimeout`.
    pub authentication_timeout: Duration,
    pub max_in_flight_requests: Option<usize>,
    pub allow_auto_topic_creation: bool,
    pub isolation_level: IsolationLevel,
    pub retry: RetryConfig,
}

impl ClusterConfig {
    pub fn new(brokers: Vec<String>) -> Self {
        ClusterConfig {
            brokers,
            transport: BrokerTransportConfig::default(),
            metadata_max_age: Duration::from_secs(5 * 60),
            authentication_timeout: Duration::from_secs(10),
            max_in_flight_requests: None,
            allow_auto_topic_creation: true,
            isolation_level: IsolationLevel::ReadUncommitted,
            retry: RetryConfig::default(),
        }
    }
}

/// The serializable subset of [`ClusterConfig`] — the parts plausibly
/// loaded from a config file rather than constructed in code (a socket
/// factory or retry closure can't round-trip through `serde`, a timeout or
/// seed list can).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfigFile {
    pub brokers: Vec<String>,
    pub metadata_max_age_ms: u64,
    pub authentication_timeout_ms: u64,
    pub allow_auto_topic_creation: bool,
}

impl From<&ClusterConfig> for ClusterConfigFile {
    fn from(config: &ClusterConfig) -> Self {
        ClusterConfigFile {
            brokers: config.brokers.clone(),
            metadata_max_age_ms: config.metadata_max_age.as_millis() as u64,
            authentication_timeout_ms: config.authentication_timeout.as_millis() as u64,
            allow_auto_topic_creation: config.allow_auto_topic_creation,
        }
    }
}
