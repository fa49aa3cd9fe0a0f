//! # document-gateway
//!
//! Rate-limited client for a document registration API.
//!
//! This crate submits documents to a single document creation endpoint while
//! enforcing a global cap on how many submissions are admitted per time
//! window. When the cap is reached a submission is rejected immediately with
//! [`SubmissionOutcome::Throttled`]; nothing is queued or retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use document_gateway::{Document, SubmissionGateway, SubmissionOutcome};
//! use std::time::Duration;
//!
//! # async fn run(document: Document) -> Result<(), Box<dyn std::error::Error>> {
//! // At most 5 submissions per second
//! let gateway = SubmissionGateway::builder()
//!     .with_period(Duration::from_secs(1))
//!     .with_request_limit(5)
//!     .build()?;
//!
//! let outcome = gateway
//!     .submit(
//!         "https://ismp.crpt.ru/api/v3/lk/documents/create",
//!         &document,
//!         "detached-signature",
//!     )
//!     .await?;
//!
//! match outcome {
//!     SubmissionOutcome::Success { status, body } => println!("{}: {}", status, body),
//!     SubmissionOutcome::Failure { status, body } => eprintln!("{}: {}", status, body),
//!     SubmissionOutcome::Throttled => eprintln!("request limit exceeded"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Permit Policies
//!
//! - [`PermitPolicy::PerWindow`] (default): every admitted attempt consumes a
//!   permit until the next refill. At most `request_limit` submissions per
//!   window.
//! - [`PermitPolicy::Concurrency`]: a permit goes back to the pool as soon as
//!   its call completes, successful or not. At most `request_limit` calls in
//!   flight at once, however long each call takes.
//!
//! A background tokio task refills the pool once per period and a refill
//! never pushes the pool above capacity. Under `Concurrency` it leaves live
//! permits alone and only recovers permits that were forgotten.
//!
//! ## Using the Limiter Alone
//!
//! ```rust
//! use document_gateway::{RateLimitConfig, RateLimiter};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RateLimitConfig::new(Duration::from_secs(60), 2).unwrap();
//! let limiter = RateLimiter::new(config).unwrap();
//!
//! assert!(limiter.try_acquire());
//! assert!(limiter.try_acquire());
//! assert!(!limiter.try_acquire()); // exhausted until the next refill
//!
//! limiter.shutdown().await.unwrap();
//! # }
//! ```
//!
//! ## Cancellation
//!
//! [`SubmissionGateway::submit_with_cancellation`] races the HTTP exchange
//! against a [`tokio_util::sync::CancellationToken`]. Admission itself never
//! blocks and needs no cancellation.
//!
//! ## Logging
//!
//! Events are emitted with `tracing`: `info` for accepted documents, `warn`
//! for throttled and rejected submissions, `error` for transport failures,
//! `debug` for window refills. Install any subscriber to see them.
//!
//! ## Features
//!
//! - `http` (default): [`HttpTransport`], a reqwest adapter
//! - `test-helpers`: scripted [`infrastructure::mocks::MockTransport`] and a
//!   log capture layer

// Domain layer - pure types and invariants
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    document::{Description, Document, Product},
    outcome::{CodecError, SubmissionOutcome, SubmitError, TransportError},
    permits::{PermitPolicy, PermitPool, Ticket},
};

pub use application::{
    gateway::{BuildError, SubmissionGateway, SubmissionGatewayBuilder, DEFAULT_DOCUMENT_CREATE_URL},
    limiter::{ConfigError, Permit, RateLimitConfig, RateLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{DocumentCodec, SubmissionRequest, Transport, TransportResponse},
    refill::{RefillHandle, RefillTask, ShutdownError},
};

pub use infrastructure::codec::JsonCodec;

#[cfg(feature = "http")]
pub use infrastructure::http::{HttpTransport, HttpTransportConfig};
