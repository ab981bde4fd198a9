//! Configuration module for rbln-npu-feature-discovery
//!
//! Provides CLI arguments with environment fallbacks and the validated
//! runtime configuration.

mod settings;

pub use settings::*;
