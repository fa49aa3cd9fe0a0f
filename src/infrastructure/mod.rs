//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Document encoding (serde_json)
//! - HTTP transport (reqwest, `http` feature)

pub mod codec;

#[cfg(feature = "http")]
pub mod http;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a scripted transport and a log capture
/// layer for exercising the gateway without a network.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// document-gateway = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
