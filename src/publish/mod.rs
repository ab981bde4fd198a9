//! Label publishing module
//!
//! Serializes collected features to the node-feature-discovery local
//! source format and replaces the output file atomically.

mod publisher;

pub use publisher::*;
