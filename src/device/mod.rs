//! Device identification module
//!
//! Provides the product/family catalog for RBLN accelerators and the
//! driver version parser.

mod catalog;
mod version;

pub use catalog::*;
pub use version::*;
