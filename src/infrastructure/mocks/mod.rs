//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of the submission pipeline.

pub mod layer;
pub mod transport;

pub use layer::{CapturedEvent, MockCaptureLayer};
pub use transport::MockTransport;
