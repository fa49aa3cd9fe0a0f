//! Domain layer - pure types and invariants with no I/O.
//!
//! This layer contains:
//! - The document wire schema and its date format
//! - The atomic permit pool and permit policies
//! - Submission outcomes and the error taxonomy
//!
//! Nothing here touches the network or the async runtime.

pub mod date_format;
pub mod document;
pub mod outcome;
pub mod permits;
