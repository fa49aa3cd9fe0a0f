//! Scripted transport for testing.

use crate::application::ports::{SubmissionRequest, Transport, TransportResponse};
use crate::domain::outcome::TransportError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const POISONED: &str = "MockTransport mutex poisoned - a test thread panicked while holding the lock";

/// Transport that records requests and replays scripted results.
///
/// Scripted results are returned in order; once the script is exhausted
/// every call gets the fallback response (`200 OK` unless changed).
/// All clones share the same script and request log.
///
/// # Examples
///
/// ```
/// use document_gateway::infrastructure::mocks::MockTransport;
/// use document_gateway::{SubmissionRequest, Transport, TransportError, TransportResponse};
///
/// # tokio_test_block(async {
/// let transport = MockTransport::new()
///     .with_response(TransportResponse::new(201, "created"))
///     .with_error(TransportError::Timeout);
///
/// let request = SubmissionRequest {
///     endpoint: "https://registry.test/create".to_string(),
///     signature: "sig".to_string(),
///     body: b"{}".to_vec(),
/// };
///
/// assert_eq!(transport.send(request.clone()).await.unwrap().status, 201);
/// assert!(transport.send(request.clone()).await.is_err());
/// assert_eq!(transport.send(request).await.unwrap().status, 200);
/// assert_eq!(transport.call_count(), 3);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

#[derive(Debug)]
struct MockState {
    script: VecDeque<Result<TransportResponse, TransportError>>,
    fallback: TransportResponse,
    requests: Vec<SubmissionRequest>,
}

impl MockTransport {
    /// Create a transport that answers every call with `200 OK`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: VecDeque::new(),
                fallback: TransportResponse::new(200, "OK"),
                requests: Vec::new(),
            })),
            delay: None,
        }
    }

    /// Queue a response.
    pub fn with_response(self, response: TransportResponse) -> Self {
        self.lock().script.push_back(Ok(response));
        self
    }

    /// Queue a transport error.
    pub fn with_error(self, error: TransportError) -> Self {
        self.lock().script.push_back(Err(error));
        self
    }

    /// Response used once the script is exhausted.
    pub fn with_fallback(self, response: TransportResponse) -> Self {
        self.lock().fallback = response;
        self
    }

    /// Wait this long (on the tokio clock) before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Forget recorded requests. The script is left untouched.
    pub fn clear(&self) {
        self.lock().requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect(POISONED)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError> {
        // Record on arrival so in-flight calls are visible to the test
        self.lock().requests.push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        match state.script.pop_front() {
            Some(result) => result,
            None => Ok(state.fallback.clone()),
        }
    }
}
