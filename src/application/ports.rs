//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::document::Document;
use crate::domain::outcome::{CodecError, TransportError};
use async_trait::async_trait;
use std::fmt::Debug;

/// Header carrying the caller's opaque signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Content type of every submission body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One outbound document creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Absolute URL of the document creation endpoint
    pub endpoint: String,
    /// Opaque signature sent in the `Signature` header
    pub signature: String,
    /// Encoded document
    pub body: Vec<u8>,
}

impl SubmissionRequest {
    /// Headers the adapter must send, as `(name, value)` pairs.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            ("Content-Type", JSON_CONTENT_TYPE),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
    }
}

/// Raw answer from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Port for performing the HTTP exchange.
///
/// Implementations own connection pooling, TLS and timeouts. Any HTTP status
/// is a successful `send`; only failures to obtain a response are errors.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// POST the request body to its endpoint with the submission headers.
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError>;
}

/// Port for turning a document into request bytes.
pub trait DocumentCodec: Send + Sync + Debug {
    /// Encode a document using the registration service's wire schema.
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError>;
}
