//! Feature collection module
//!
//! Provides the collection cycle: daemon first, sysfs as fallback,
//! catalog and version parsing on whatever answered, then publish.

mod cycle;
mod features;

pub use cycle::*;
pub use features::*;
