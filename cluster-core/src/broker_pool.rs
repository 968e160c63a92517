//! Owns every live [`Broker`], the cached [`ClusterMetadataSnapshot`], and
//! the single-flight metadata refresh.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use broker_client::{Broker, ConnectionBuilder, NodeId};
use futures::future::{FutureExt, Shared};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::broker_factory::BrokerFactory;
use crate::error::ClusterError;
use crate::metadata::ClusterMetadataSnapshot;

type RefreshFuture = Shared<Pin<Box<dyn Future<Output = Result<Arc<ClusterMetadataSnapshot>, ClusterError>> + Send>>>;

/// Owns the seed broker, the `nodeId -> Broker` registry, and the cached
/// metadata snapshot.
///
/// `BrokerPool` is always handed out wrapped in an `Arc` (see
/// [`BrokerPool::new`]) because its single-flight refresh and per-node
/// connect locks both need to spawn `'static` futures that outlive any one
/// caller's stack frame, which is why its refresh methods take an
/// `Arc<Self>` receiver instead of `&self`.
pub struct BrokerPool {
    connection_builder: ConnectionBuilder,
    broker_factory: Arc<dyn BrokerFactory>,
    seed_broker: AsyncMutex<Option<Arc<dyn Broker>>>,
    brokers: RwLock<HashMap<NodeId, Arc<dyn Broker>>>,
    connect_locks: AsyncMutex<HashMap<NodeId, Arc<AsyncMutex<()>>>>,
    metadata: RwLock<Option<Arc<ClusterMetadataSnapshot>>>,
    refresh_inflight: std::sync::Mutex<Option<RefreshFuture>>,
    metadata_max_age: Duration,
    authentication_timeout: Duration,
}

impl std::fmt::Debug for BrokerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerPool").finish_non_exhaustive()
    }
}

impl BrokerPool {
    pub fn new(
        connection_builder: ConnectionBuilder,
        broker_factory: Arc<dyn BrokerFactory>,
        metadata_max_age: Duration,
        authentication_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(BrokerPool {
            connection_builder,
            broker_factory,
            seed_broker: AsyncMutex::new(None),
            brokers: RwLock::new(HashMap::new()),
            connect_locks: AsyncMutex::new(HashMap::new()),
            metadata: RwLock::new(None),
            refresh_inflight: std::sync::Mutex::new(None),
            metadata_max_age,
            authentication_timeout,
        })
    }

    /// Materializes at least one broker: reuses the seed connection if it's
    /// still alive, otherwise dials the next seed address in round-robin
    /// order.
    pub async fn connect(&self) -> Result<(), ClusterError> {
        if self.has_connected_brokers().await {
            return Ok(());
        }
        let mut seed_guard = self.seed_broker.lock().await;
        if let Some(seed) = seed_guard.as_ref() {
            if seed.is_connected() {
                return Ok(());
            }
        }
        let addr = self.connection_builder.next_seed_addr();
        let broker = self
            .broker_factory
            .create(addr, self.connection_builder.transport());
        broker.connect().await?;
        *seed_guard = Some(broker);
        Ok(())
    }

    /// Tears down every live broker and drops the cached snapshot.
    pub async fn disconnect(&self) {
        if let Some(seed) = self.seed_broker.lock().await.take() {
            seed.disconnect().await;
        }
        let mut brokers = self.brokers.write().await;
        for (_, broker) in brokers.drain() {
            broker.disconnect().await;
        }
        drop(brokers);
        *self.metadata.write().await = None;
        self.connect_locks.lock().await.clear();
    }

    pub async fn has_connected_brokers(&self) -> bool {
        if let Some(seed) = self.seed_broker.lock().await.as_ref() {
            if seed.is_connected() {
                return true;
            }
        }
        self.brokers.read().await.values().any(|b| b.is_connected())
    }

    /// Invokes `f` with any connected broker. Once real cluster brokers are
    /// discovered, they're preferred over the bootstrap seed — see
    /// DESIGN.md for why this crate treats "the seed may be replaced" as a
    /// preference rather than an eager swap.
    pub async fn with_broker<T, F, Fut>(&self, f: F) -> Result<T, ClusterError>
    where
        F: FnOnce(NodeId, Arc<dyn Broker>) -> Fut,
        Fut: Future<Output = Result<T, ClusterError>>,
    {
        let (node_id, broker) = self
            .any_connected_broker()
            .await
            .ok_or(ClusterError::BrokerNotConnected)?;
        f(node_id, broker).await
    }

    async fn any_connected_broker(&self) -> Option<(NodeId, Arc<dyn Broker>)> {
        {
            let brokers = self.brokers.read().await;
            if let Some((node_id, broker)) = brokers.iter().find(|(_, b)| b.is_connected()) {
                return Some((*node_id, Arc::clone(broker)));
            }
        }
        let seed_guard = self.seed_broker.lock().await;
        match seed_guard.as_ref() {
            Some(seed) if seed.is_connected() => Some((seed.node_id().unwrap_or(-1), Arc::clone(seed))),
            _ => None,
        }
    }

    /// Returns the broker for `node_id`, connecting it lazily from the
    /// current snapshot if necessary. Connection attempts for the same
    /// `node_id` are serialized: a second caller waits on the first
    /// caller's connect attempt rather than dialing a second socket.
    pub async fn find_broker(&self, node_id: NodeId) -> Result<Arc<dyn Broker>, ClusterError> {
        if let Some(broker) = self.brokers.read().await.get(&node_id) {
            return Ok(Arc::clone(broker));
        }

        let snapshot = self
            .metadata
            .read()
            .await
            .clone()
            .ok_or(ClusterError::BrokerNotFound(node_id))?;
        let broker_meta = snapshot
            .broker(node_id)
            .cloned()
            .ok_or(ClusterError::BrokerNotFound(node_id))?;

        let lock = self.connect_lock_for(node_id).await;
        let _guard = tokio::time::timeout(self.authentication_timeout, lock.lock())
            .await
            .map_err(|_| ClusterError::LockTimeout(node_id))?;

        // Re-check: another caller may have finished connecting while we
        // waited for the lock.
        if let Some(broker) = self.brokers.read().await.get(&node_id) {
            return Ok(Arc::clone(broker));
        }

        let addr = self.connection_builder.addr_for_metadata(&broker_meta);
        let broker = self
            .broker_factory
            .create(addr, self.connection_builder.transport());
        broker.connect().await?;
        self.brokers.write().await.insert(node_id, Arc::clone(&broker));
        Ok(broker)
    }

    async fn connect_lock_for(&self, node_id: NodeId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.connect_locks.lock().await;
        Arc::clone(
            locks
                .entry(node_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Refreshes metadata for `topics` and installs it as the new snapshot.
    /// Concurrent callers coalesce into the single physical fetch that the
    /// first caller starts; every caller resolves once that fetch
    /// completes, from the same installed snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_metadata(
        self: &Arc<Self>,
        topics: &[String],
    ) -> Result<Arc<ClusterMetadataSnapshot>, ClusterError> {
        let shared = {
            let mut inflight = self.refresh_inflight.lock().unwrap();
            match inflight.as_ref() {
                Some(shared) => shared.clone(),
                None => {
                    let pool = Arc::clone(self);
                    let topics = topics.to_vec();
                    let fut: Pin<Box<dyn Future<Output = Result<Arc<ClusterMetadataSnapshot>, ClusterError>> + Send>> =
                        Box::pin(async move {
                            let result = pool.fetch_and_install(&topics).await;
                            *pool.refresh_inflight.lock().unwrap() = None;
                            result
                        });
                    let shared = fut.shared();
                    *inflight = Some(shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Refreshes only if the snapshot is absent, stale, or missing one of
    /// `topics`.
    pub async fn refresh_metadata_if_necessary(
        self: &Arc<Self>,
        topics: &[String],
    ) -> Result<Arc<ClusterMetadataSnapshot>, ClusterError> {
        let current = self.metadata.read().await.clone();
        let needs_refresh = match &current {
            None => true,
            Some(snapshot) => {
                snapshot.fetched_at.elapsed() > self.metadata_max_age
                    || topics.iter().any(|t| !snapshot.has_topic(t))
            }
        };
        if needs_refresh {
            self.refresh_metadata(topics).await
        } else {
            Ok(current.expect("needs_refresh is false only when current is Some"))
        }
    }

    /// The currently cached snapshot, if any, without triggering a refresh.
    pub async fn current_metadata(&self) -> Option<Arc<ClusterMetadataSnapshot>> {
        self.metadata.read().await.clone()
    }

    async fn fetch_and_install(
        &self,
        topics: &[String],
    ) -> Result<Arc<ClusterMetadataSnapshot>, ClusterError> {
        let response = match self.any_connected_broker().await {
            Some((_, broker)) => match broker.metadata(topics).await {
                Ok(response) => response,
                Err(primary_err) => self.metadata_from_seed(topics).await.map_err(|seed_err| {
                    tracing::warn!(
                        error = %primary_err,
                        seed_error = %seed_err,
                        "metadata refresh failed on primary broker and seed broker"
                    );
                    seed_err
                })?,
            },
            None => self.metadata_from_seed(topics).await?,
        };

        let snapshot = Arc::new(ClusterMetadataSnapshot::from_response(response, Instant::now()));
        self.reconcile(&snapshot).await;
        *self.metadata.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn metadata_from_seed(&self, topics: &[String]) -> Result<broker_client::MetadataResponse, ClusterError> {
        let seed = self
            .seed_broker
            .lock()
            .await
            .clone()
            .ok_or(ClusterError::BrokerNotConnected)?;
        Ok(seed.metadata(topics).await?)
    }

    /// Keeps brokers whose `nodeId` is still present in `snapshot`;
    /// disconnects and drops the rest. Never eagerly connects new ones.
    async fn reconcile(&self, snapshot: &ClusterMetadataSnapshot) {
        let keep: std::collections::HashSet<NodeId> =
            snapshot.brokers.iter().map(|b| b.node_id).collect();
        let stale: Vec<Arc<dyn Broker>> = {
            let mut brokers = self.brokers.write().await;
            let mut stale = Vec::new();
            brokers.retain(|node_id, broker| {
                if keep.contains(node_id) {
                    true
                } else {
                    stale.push(Arc::clone(broker));
                    false
                }
            });
            stale
        };
        for broker in stale {
            broker.disconnect().await;
        }
    }
}
