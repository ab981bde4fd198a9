//! Agent module
//!
//! Provides the periodic collection loop and shutdown signal wiring.

mod runner;
mod signals;

pub use runner::*;
pub use signals::*;
