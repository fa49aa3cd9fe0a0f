//! Submission outcomes and errors.
//!
//! `Throttled`, `Success` and `Failure` are ordinary outcome values. Only
//! problems that prevented a response from being obtained are errors.

use thiserror::Error;

/// Result of one submission attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service answered with a 2xx status
    Success {
        /// HTTP status code
        status: u16,
        /// Response body as opaque text
        body: String,
    },
    /// The service answered with a non-2xx status
    Failure {
        /// HTTP status code
        status: u16,
        /// Response body as opaque diagnostic text
        body: String,
    },
    /// No permit was available; nothing was sent. Try again later.
    Throttled,
}

impl SubmissionOutcome {
    /// Classify an HTTP status and body.
    pub fn from_response(status: u16, body: String) -> Self {
        if (200..300).contains(&status) {
            SubmissionOutcome::Success { status, body }
        } else {
            SubmissionOutcome::Failure { status, body }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SubmissionOutcome::Failure { .. })
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, SubmissionOutcome::Throttled)
    }

    /// HTTP status, if the request was sent.
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmissionOutcome::Success { status, .. } | SubmissionOutcome::Failure { status, .. } => {
                Some(*status)
            }
            SubmissionOutcome::Throttled => None,
        }
    }

    /// Response body, if the request was sent.
    pub fn body(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Success { body, .. } | SubmissionOutcome::Failure { body, .. } => {
                Some(body)
            }
            SubmissionOutcome::Throttled => None,
        }
    }
}

/// Error produced while encoding or decoding a document.
///
/// Wraps whatever error the codec implementation reports.
#[derive(Debug, Error)]
#[error("document codec error: {source}")]
pub struct CodecError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl CodecError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Connection-level failure reported by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint could not be parsed as a URL
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    /// Connection refused, DNS or TLS failure
    #[error("connection failed: {0}")]
    Connect(String),
    /// The exchange did not complete in time
    #[error("request timed out")]
    Timeout,
    /// Redirect loop or redirect limit exceeded
    #[error("redirect failed: {0}")]
    Redirect(String),
    /// Response body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),
    /// The underlying client could not be constructed
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Error returned by a submission that did not produce an outcome.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Encode(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The caller cancelled the submission before a response arrived
    #[error("submission cancelled")]
    Cancelled,
}

impl SubmitError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport(_))
    }
}
