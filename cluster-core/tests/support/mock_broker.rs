use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use broker_client::{
    Broker, BrokerError, FindCoordinatorRequest, FindCoordinatorResponse, ListOffsetsRequest,
    ListOffsetsResponse, MetadataResponse, NodeId,
};

/// A queue of canned responses. Once exhausted, repeats the last one —
/// convenient for retry tests that push one failure then one success and
/// don't care how many more times the success gets served.
struct ResponseQueue<T, E> {
    items: Mutex<(Vec<Result<T, E>>, usize)>,
}

impl<T: Clone, E: Clone> ResponseQueue<T, E> {
    fn new() -> Self {
        ResponseQueue {
            items: Mutex::new((Vec::new(), 0)),
        }
    }

    fn push(&self, item: Result<T, E>) {
        self.items.lock().unwrap().0.push(item);
    }

    fn next(&self) -> Result<T, E> {
        let mut guard = self.items.lock().unwrap();
        let (items, cursor) = &mut *guard;
        assert!(!items.is_empty(), "mock broker: no queued response");
        let i = (*cursor).min(items.len() - 1);
        if *cursor < items.len() - 1 {
            *cursor += 1;
        }
        items[i].clone()
    }
}

/// A [`Broker`] double with scriptable responses, for exercising
/// `cluster-core` without a real transport.
#[derive(Debug)]
pub struct MockBroker {
    node_id: Option<NodeId>,
    connected: AtomicBool,
    metadata: ResponseQueue<MetadataResponse, BrokerError>,
    coordinator: ResponseQueue<FindCoordinatorResponse, BrokerError>,
    offsets: ResponseQueue<ListOffsetsResponse, BrokerError>,
    connect_result: Mutex<Option<Result<(), BrokerError>>>,
    metadata_delay: Mutex<Option<Duration>>,
    metadata_calls: AtomicUsize,
    coordinator_calls: AtomicUsize,
    offsets_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    last_offsets_request: Mutex<Option<ListOffsetsRequest>>,
}

impl std::fmt::Debug for ResponseQueue<MetadataResponse, BrokerError> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseQueue").finish_non_exhaustive()
    }
}
impl std::fmt::Debug for ResponseQueue<FindCoordinatorResponse, BrokerError> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseQueue").finish_non_exhaustive()
    }
}
impl std::fmt::Debug for ResponseQueue<ListOffsetsResponse, BrokerError> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseQueue").finish_non_exhaustive()
    }
}

impl MockBroker {
    pub fn new(node_id: Option<NodeId>) -> Self {
        MockBroker {
            node_id,
            connected: AtomicBool::new(false),
            metadata: ResponseQueue::new(),
            coordinator: ResponseQueue::new(),
            offsets: ResponseQueue::new(),
            connect_result: Mutex::new(None),
            metadata_delay: Mutex::new(None),
            metadata_calls: AtomicUsize::new(0),
            coordinator_calls: AtomicUsize::new(0),
            offsets_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            last_offsets_request: Mutex::new(None),
        }
    }

    /// The most recent `list_offsets` request this broker received, if any.
    pub fn last_offsets_request(&self) -> Option<ListOffsetsRequest> {
        self.last_offsets_request.lock().unwrap().clone()
    }

    pub fn metadata_call_count(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn coordinator_call_count(&self) -> usize {
        self.coordinator_calls.load(Ordering::SeqCst)
    }

    pub fn offsets_call_count(&self) -> usize {
        self.offsets_calls.load(Ordering::SeqCst)
    }

    pub fn connect_call_count(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn push_metadata(&self, response: Result<MetadataResponse, BrokerError>) {
        self.metadata.push(response);
    }

    pub fn push_coordinator(&self, response: Result<FindCoordinatorResponse, BrokerError>) {
        self.coordinator.push(response);
    }

    pub fn push_offsets(&self, response: Result<ListOffsetsResponse, BrokerError>) {
        self.offsets.push(response);
    }

    pub fn fail_connect(&self, error: BrokerError) {
        *self.connect_result.lock().unwrap() = Some(Err(error));
    }

    /// Delays every `metadata()` response by `delay`. Used by tests that
    /// need to observe two callers' requests genuinely overlapping in time,
    /// rather than resolving synchronously within a single poll.
    pub fn delay_metadata(&self, delay: Duration) {
        *self.metadata_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl Broker for MockBroker {
    fn node_id(&self) -> Option<NodeId> {
        self.node_id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), BrokerError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.connect_result.lock().unwrap().take() {
            result?;
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn metadata(&self, _topics: &[String]) -> Result<MetadataResponse, BrokerError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = *self.metadata_delay.lock().unwrap() {
            tokio::time::sleep(delay).await;
        }
        self.metadata.next()
    }

    async fn find_group_coordinator(
        &self,
        _request: FindCoordinatorRequest,
    ) -> Result<FindCoordinatorResponse, BrokerError> {
        self.coordinator_calls.fetch_add(1, Ordering::SeqCst);
        self.coordinator.next()
    }

    async fn list_offsets(
        &self,
        request: ListOffsetsRequest,
    ) -> Result<ListOffsetsResponse, BrokerError> {
        self.offsets_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_offsets_request.lock().unwrap() = Some(request);
        self.offsets.next()
    }
}
