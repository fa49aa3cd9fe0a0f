//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain types and owns the runtime behavior:
//! - Rate limiter (permit pool plus periodic refill)
//! - Refill task (background window resets)
//! - Submission gateway (admission, encoding, sending, classification)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters implement, keeping the pipeline independent of serde_json
//! and reqwest.

pub mod gateway;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod refill;
