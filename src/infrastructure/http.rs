//! reqwest-backed transport adapter.
//!
//! One `reqwest::Client` is built per transport and reused for every
//! submission, so connections are pooled and kept alive between calls.

use crate::application::ports::{
    SubmissionRequest, Transport, TransportResponse, JSON_CONTENT_TYPE, SIGNATURE_HEADER,
};
use crate::domain::outcome::TransportError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::time::Duration;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Total time allowed for one exchange; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Time allowed to establish a connection
    pub connect_timeout: Option<Duration>,
    /// Redirects followed before failing; 0 disables redirects
    pub max_redirects: usize,
    /// Speak HTTP/1.1 only
    pub http1_only: bool,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            max_redirects: 10,
            http1_only: true,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpTransportConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_http1_only(mut self, http1_only: bool) -> Self {
        self.http1_only = http1_only;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Sends submissions with a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    /// Returns `TransportError::Client` if the TLS backend or client cannot
    /// be initialised.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };

        let mut builder = Client::builder()
            .redirect(redirect)
            .user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if config.http1_only {
            builder = builder.http1_only();
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client. Its redirect and timeout settings apply as-is.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError> {
        let url = Url::parse(&request.endpoint)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.endpoint, e)))?;

        tracing::trace!(%url, bytes = request.body.len(), "sending document");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(SIGNATURE_HEADER, request.signature.as_str())
            .body(request.body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_redirect() {
        TransportError::Redirect(err.to_string())
    } else if err.is_body() || err.is_decode() {
        TransportError::Body(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
