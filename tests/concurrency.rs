//! Admission bounds under real parallelism.

mod common;

use async_trait::async_trait;
use common::{document, ENDPOINT};
use document_gateway::infrastructure::mocks::MockTransport;
use document_gateway::{
    PermitPolicy, SubmissionGateway, SubmissionRequest, Transport, TransportError,
    TransportResponse,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tracks the highest number of simultaneous sends.
#[derive(Debug)]
struct InFlightTransport {
    delay: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl InFlightTransport {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for InFlightTransport {
    async fn send(&self, _request: SubmissionRequest) -> Result<TransportResponse, TransportError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(TransportResponse::new(201, "created"))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_submissions_admit_exactly_limit() {
    let transport = MockTransport::new();
    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_secs(3600))
        .with_request_limit(10)
        .with_transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .submit(ENDPOINT, &document(&format!("doc-{}", i)), "sig")
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut throttled = 0;
    for handle in handles {
        let outcome = handle.await.unwrap();
        if outcome.is_success() {
            succeeded += 1;
        } else if outcome.is_throttled() {
            throttled += 1;
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(throttled, 40);
    assert_eq!(transport.call_count(), 10);
    assert_eq!(gateway.limiter().available(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_policy_bounds_in_flight_calls() {
    let transport = Arc::new(InFlightTransport::new(Duration::from_millis(20)));
    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_secs(3600))
        .with_request_limit(3)
        .with_policy(PermitPolicy::Concurrency)
        .with_transport(transport.clone())
        .build()
        .unwrap();

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                // Spread arrivals so some land after earlier calls finished
                tokio::time::sleep(Duration::from_millis((i % 8) * 10)).await;
                gateway.submit(ENDPOINT, &document("d"), "sig").await.unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(transport.peak.load(Ordering::SeqCst) <= 3);
    assert!(transport.total.load(Ordering::SeqCst) >= 3);
    // Every permit came back once its call completed
    assert_eq!(gateway.limiter().available(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_calls_longer_than_period_stay_bounded() {
    let transport = Arc::new(InFlightTransport::new(Duration::from_secs(10)));
    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_secs(1))
        .with_request_limit(1)
        .with_policy(PermitPolicy::Concurrency)
        .with_transport(transport.clone())
        .build()
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..5 {
        let gateway = gateway.clone();
        handles.push(tokio::spawn(async move {
            gateway
                .submit(ENDPOINT, &document(&format!("doc-{}", i)), "sig")
                .await
                .unwrap()
        }));
        tokio::time::sleep(Duration::from_millis(1100)).await;
    }

    let outcomes: Vec<_> = join_all(handles).await;
    assert_eq!(transport.peak.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_throttled()).count(), 4);

    // Once the long call finished its permit is back
    assert_eq!(gateway.limiter().in_flight(), 0);
    assert_eq!(gateway.limiter().available(), 1);
}

async fn join_all<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manual_refills_race_background_refill() {
    const LIMIT: u32 = 4;
    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_millis(1))
        .with_request_limit(LIMIT)
        .with_transport(Arc::new(MockTransport::new()))
        .build()
        .unwrap();

    let refillers: Vec<_> = (0..3)
        .map(|_| {
            let limiter = gateway.limiter().clone();
            std::thread::spawn(move || {
                for _ in 0..5_000 {
                    limiter.refill_now();
                    assert!(limiter.available() <= LIMIT);
                }
            })
        })
        .collect();

    let submitters: Vec<_> = (0..4)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    let _ = gateway.submit(ENDPOINT, &document("d"), "s").await.unwrap();
                    assert!(gateway.limiter().available() <= LIMIT);
                }
            })
        })
        .collect();

    for handle in submitters {
        handle.await.unwrap();
    }
    for handle in refillers {
        handle.join().unwrap();
    }

    gateway.limiter().refill_now();
    assert_eq!(gateway.limiter().available(), LIMIT);
}

#[tokio::test(start_paused = true)]
async fn test_refill_restores_capacity_under_load() {
    let transport = MockTransport::new();
    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_millis(100))
        .with_request_limit(5)
        .with_transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    for _ in 0..5 {
        assert!(gateway.submit(ENDPOINT, &document("d"), "s").await.unwrap().is_success());
    }
    assert!(gateway.submit(ENDPOINT, &document("d"), "s").await.unwrap().is_throttled());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(gateway.limiter().available(), 5);
    assert_eq!(gateway.metrics().refills(), 1);
}
