use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use drain_protocol::ReceiverRequest;

use crate::ingress::{EnvelopeStream, IngressError, LogsConnector, LogsProviderClient};
use crate::{ClientPool, PoolConfig};

/// Mock connector that counts connects and closes, serves scripted connect
/// errors, and shares one validity flag across all its clients.
struct MockConnector {
    connect_calls: AtomicUsize,
    live: Arc<AtomicIsize>,
    closes: Arc<AtomicUsize>,
    errors: Mutex<VecDeque<String>>,
    valid: Arc<AtomicBool>,
}

impl MockConnector {
    fn new() -> Self {
        Self {
            connect_calls: AtomicUsize::new(0),
            live: Arc::new(AtomicIsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            errors: Mutex::new(VecDeque::new()),
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    fn queue_errors(&self, n: usize) {
        let mut errors = self.errors.lock().unwrap();
        for _ in 0..n {
            errors.push_back("an-error".to_string());
        }
    }

    fn invalidate_all(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }

    fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    fn live(&self) -> isize {
        self.live.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogsConnector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn LogsProviderClient>, IngressError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.errors.lock().unwrap().pop_front() {
            return Err(IngressError::Malformed(message));
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockClient {
            live: Arc::clone(&self.live),
            closes: Arc::clone(&self.closes),
            valid: Arc::clone(&self.valid),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MockClient {
    live: Arc<AtomicIsize>,
    closes: Arc<AtomicUsize>,
    valid: Arc<AtomicBool>,
    closed: AtomicBool,
}

#[async_trait]
impl LogsProviderClient for MockClient {
    async fn receiver(
        &self,
        _request: ReceiverRequest,
    ) -> Result<Box<dyn EnvelopeStream>, IngressError> {
        Err(IngressError::NotConnected)
    }

    fn valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn fast_config() -> PoolConfig {
    PoolConfig {
        connection_count: 5,
        rotation_interval: Duration::from_millis(10),
        validity_interval: Duration::from_millis(1),
        retry_wait: Duration::from_millis(10),
    }
}

/// Poll until `predicate` holds, or fail after two seconds.
async fn eventually(what: &str, predicate: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(predicate(), "timed out waiting for {what}");
}

#[tokio::test]
async fn test_rolls_connections_over_time() {
    let connector = Arc::new(MockConnector::new());
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, fast_config());

    eventually("pool to fill", || connector.live() == 5).await;
    // Rotation keeps opening fresh connections and closing old ones while
    // the live count holds steady.
    eventually("rotations to close old clients", || connector.closes() > 5).await;
    eventually("pool to stay full", || connector.live() == 5).await;
    assert!(connector.connect_calls() > 5);

    pool.shutdown().await;
}

#[tokio::test]
async fn test_replaces_invalid_connections() {
    let connector = Arc::new(MockConnector::new());
    let config = PoolConfig {
        rotation_interval: Duration::from_secs(3600),
        validity_interval: Duration::from_millis(1),
        ..fast_config()
    };
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, config);

    eventually("pool to fill", || connector.live() == 5).await;
    connector.invalidate_all();

    eventually("sweeps to close invalid clients", || connector.closes() > 5).await;
    eventually("pool to stay full", || connector.live() == 5).await;

    pool.shutdown().await;
}

#[tokio::test]
async fn test_next_round_robins_distinct_clients() {
    let connector = Arc::new(MockConnector::new());
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, fast_config());

    eventually("pool to fill", || connector.live() == 5).await;

    let first = pool.next();
    let second = pool.next();
    assert!(!Arc::ptr_eq(&first, &second));

    pool.shutdown().await;
}

#[tokio::test]
async fn test_next_never_returns_an_empty_handle() {
    let connector = Arc::new(MockConnector::new());
    connector.queue_errors(15);
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, fast_config());

    let client = pool.next();
    let err = client
        .receiver(ReceiverRequest {
            app_id: "app-guid".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IngressError::NotConnected));

    pool.shutdown().await;
}

#[tokio::test]
async fn test_keeps_retrying_failed_connects() {
    let connector = Arc::new(MockConnector::new());
    connector.queue_errors(15);
    let config = PoolConfig {
        rotation_interval: Duration::from_secs(3600),
        validity_interval: Duration::from_millis(1),
        retry_wait: Duration::from_millis(5),
        ..fast_config()
    };
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, config);

    eventually("connector to keep retrying", || {
        connector.connect_calls() > 5
    })
    .await;
    eventually("pool to recover", || connector.live() == 5).await;
    assert_eq!(pool.live_count(), 5);

    pool.shutdown().await;
}

#[tokio::test]
async fn test_live_count_never_exceeds_pool_size() {
    let connector = Arc::new(MockConnector::new());
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, fast_config());

    eventually("pool to fill", || connector.live() == 5).await;
    for _ in 0..20 {
        assert!(pool.live_count() <= 5);
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    pool.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_every_client() {
    let connector = Arc::new(MockConnector::new());
    let pool = ClientPool::start(Arc::clone(&connector) as Arc<dyn LogsConnector>, fast_config());

    eventually("pool to fill", || connector.live() == 5).await;
    pool.shutdown().await;

    assert_eq!(connector.live(), 0);
    assert_eq!(pool.live_count(), 0);
}
