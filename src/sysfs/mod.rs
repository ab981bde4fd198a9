//! Sysfs inspection module
//!
//! Degraded-mode data source: reads device presence and driver version
//! directly from kernel-exposed attribute files.

mod scanner;

pub use scanner::*;
