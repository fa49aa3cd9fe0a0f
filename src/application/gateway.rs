//! Submission pipeline.
//!
//! Each call runs to completion as a straight line:
//! admitted → encoded → sent → classified, or stops at throttled when no
//! permit is available. Nothing is retried here; a retry is a new call.

use crate::application::limiter::{ConfigError, RateLimitConfig, RateLimiter};
use crate::application::metrics::Metrics;
use crate::application::ports::{DocumentCodec, SubmissionRequest, Transport};
use crate::application::refill::ShutdownError;
use crate::domain::document::Document;
use crate::domain::outcome::{SubmissionOutcome, SubmitError, TransportError};
use crate::domain::permits::PermitPolicy;
use crate::infrastructure::codec::JsonCodec;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Document creation endpoint of the registration service.
pub const DEFAULT_DOCUMENT_CREATE_URL: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Error returned when building a `SubmissionGateway` fails.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Rate limit configuration is invalid
    #[error("rate limit configuration error: {0}")]
    Config(#[from] ConfigError),
    /// No transport was supplied and the `http` feature is disabled
    #[error("no transport configured")]
    MissingTransport,
    /// The default HTTP transport could not be created
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Builder for constructing a `SubmissionGateway`.
pub struct SubmissionGatewayBuilder {
    period: Duration,
    request_limit: u32,
    policy: PermitPolicy,
    transport: Option<Arc<dyn Transport>>,
    codec: Arc<dyn DocumentCodec>,
    default_endpoint: String,
    runtime: Option<Handle>,
}

impl SubmissionGatewayBuilder {
    /// Set the window length. Default: 1 second.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the number of submissions admitted per window. Default: 1.
    pub fn with_request_limit(mut self, request_limit: u32) -> Self {
        self.request_limit = request_limit;
        self
    }

    /// Set how permits return to the pool. Default: per window.
    pub fn with_policy(mut self, policy: PermitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take period, limit and policy from a validated config.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.period = config.period();
        self.request_limit = config.request_limit();
        self.policy = config.policy();
        self
    }

    /// Use a custom transport adapter.
    ///
    /// Without one, `build` creates an `HttpTransport` with default settings
    /// (requires the `http` feature).
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom document codec. Default: `JsonCodec`.
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Endpoint used by [`SubmissionGateway::submit_default`].
    pub fn with_default_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_endpoint = endpoint.into();
        self
    }

    /// Runtime that hosts the refill task. Default: the current runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the gateway and start its refill task.
    ///
    /// # Errors
    /// Returns `BuildError` if the rate limit is invalid, no runtime with
    /// timers is available, or no transport can be created.
    pub fn build(self) -> Result<SubmissionGateway, BuildError> {
        let config = RateLimitConfig::new(self.period, self.request_limit)?.with_policy(self.policy);

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| ConfigError::NoRuntime)?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        let metrics = Metrics::new();
        let limiter = RateLimiter::with_metrics(config, &runtime, metrics.clone())?;

        Ok(SubmissionGateway {
            limiter,
            transport,
            codec: self.codec,
            metrics,
            default_endpoint: Arc::from(self.default_endpoint),
        })
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>, BuildError> {
    use crate::infrastructure::http::{HttpTransport, HttpTransportConfig};
    Ok(Arc::new(HttpTransport::new(HttpTransportConfig::default())?))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>, BuildError> {
    Err(BuildError::MissingTransport)
}

/// Rate-limited client for the document creation endpoint.
///
/// Cheap to clone; clones share the limiter, transport and metrics, so a
/// single gateway can be used from any number of tasks.
///
/// # Example
///
/// ```no_run
/// # use document_gateway::{Document, SubmissionGateway, SubmissionOutcome};
/// # use std::time::Duration;
/// # async fn example(document: Document) -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = SubmissionGateway::builder()
///     .with_period(Duration::from_secs(1))
///     .with_request_limit(10)
///     .build()?;
///
/// match gateway.submit_default(&document, "signature").await? {
///     SubmissionOutcome::Success { body, .. } => println!("registered: {}", body),
///     SubmissionOutcome::Failure { status, body } => println!("rejected {}: {}", status, body),
///     SubmissionOutcome::Throttled => println!("try again later"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SubmissionGateway {
    limiter: RateLimiter,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn DocumentCodec>,
    metrics: Metrics,
    default_endpoint: Arc<str>,
}

impl SubmissionGateway {
    /// Create a builder for configuring the gateway.
    ///
    /// Defaults:
    /// - Rate limit: 1 submission per second, per-window policy
    /// - Transport: `HttpTransport` with default settings
    /// - Codec: `JsonCodec`
    /// - Default endpoint: [`DEFAULT_DOCUMENT_CREATE_URL`]
    pub fn builder() -> SubmissionGatewayBuilder {
        SubmissionGatewayBuilder {
            period: Duration::from_secs(1),
            request_limit: 1,
            policy: PermitPolicy::default(),
            transport: None,
            codec: Arc::new(JsonCodec::new()),
            default_endpoint: DEFAULT_DOCUMENT_CREATE_URL.to_string(),
            runtime: None,
        }
    }

    /// Submit a document to `endpoint`.
    ///
    /// Returns `Ok(Throttled)` without any network traffic when no permit is
    /// available, and `Ok(Success | Failure)` once the service answered.
    ///
    /// # Errors
    /// Returns `SubmitError::Encode` or `SubmitError::Transport` when no
    /// response could be obtained.
    pub async fn submit(
        &self,
        endpoint: &str,
        document: &Document,
        signature: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        self.run(endpoint, document, signature, None).await
    }

    /// Submit a document to the configured default endpoint.
    pub async fn submit_default(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let endpoint = Arc::clone(&self.default_endpoint);
        self.run(&endpoint, document, signature, None).await
    }

    /// Submit a document, abandoning the exchange if `cancel` fires first.
    ///
    /// A token that is already cancelled consumes no permit.
    ///
    /// # Errors
    /// Returns `SubmitError::Cancelled` on cancellation, otherwise as
    /// [`SubmissionGateway::submit`].
    pub async fn submit_with_cancellation(
        &self,
        endpoint: &str,
        document: &Document,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmissionOutcome, SubmitError> {
        self.run(endpoint, document, signature, Some(cancel)).await
    }

    async fn run(
        &self,
        endpoint: &str,
        document: &Document,
        signature: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<SubmissionOutcome, SubmitError> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            self.metrics.record_cancelled();
            return Err(SubmitError::Cancelled);
        }

        let Some(permit) = self.limiter.try_acquire_permit() else {
            tracing::warn!(
                endpoint,
                doc_id = %document.doc_id,
                "request limit exceeded, submission throttled"
            );
            return Ok(SubmissionOutcome::Throttled);
        };

        let body = self.codec.encode(document).map_err(|e| {
            self.metrics.record_error();
            tracing::error!(doc_id = %document.doc_id, error = %e, "failed to encode document");
            SubmitError::from(e)
        })?;

        let request = SubmissionRequest {
            endpoint: endpoint.to_string(),
            signature: signature.to_string(),
            body,
        };
        let exchange = self.transport.send(request);

        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.metrics.record_cancelled();
                    tracing::warn!(endpoint, doc_id = %document.doc_id, "submission cancelled");
                    return Err(SubmitError::Cancelled);
                }
                result = exchange => result,
            },
            None => exchange.await,
        };
        // The exchange is over whatever its result; the permit goes back now
        // under the concurrency policy.
        drop(permit);

        let response = result.map_err(|e| {
            self.metrics.record_error();
            tracing::error!(endpoint, doc_id = %document.doc_id, error = %e, "transport error");
            SubmitError::from(e)
        })?;

        let outcome = SubmissionOutcome::from_response(response.status, response.body);
        match &outcome {
            SubmissionOutcome::Success { status, .. } => {
                self.metrics.record_succeeded();
                tracing::info!(endpoint, doc_id = %document.doc_id, status, "document submitted");
            }
            SubmissionOutcome::Failure { status, body } => {
                self.metrics.record_failed();
                tracing::warn!(
                    endpoint,
                    doc_id = %document.doc_id,
                    status,
                    body = %body,
                    "document submission rejected"
                );
            }
            SubmissionOutcome::Throttled => {}
        }
        Ok(outcome)
    }

    /// The rate limiter guarding this gateway.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Get the admission and outcome counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the endpoint used by [`SubmissionGateway::submit_default`].
    pub fn default_endpoint(&self) -> &str {
        &self.default_endpoint
    }

    /// Stop the refill task. Submissions still work but permits are no
    /// longer restored.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the refill task panicked.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        self.limiter.shutdown().await
    }
}

impl fmt::Debug for SubmissionGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionGateway")
            .field("limiter", &self.limiter)
            .field("transport", &self.transport)
            .field("codec", &self.codec)
            .field("default_endpoint", &self.default_endpoint)
            .finish()
    }
}
