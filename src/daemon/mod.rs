//! rbln-daemon module
//!
//! Provides the query interface the collector uses to ask the
//! device-management service about serviceable devices, and its gRPC
//! implementation.
//!
//! | RPC | Kind | Used for |
//! |-----|------|----------|
//! | `GetServiceableDeviceList` | server streaming | presence, count, product |
//! | `GetVersion` | unary | driver version |

mod client;
mod grpc;
pub mod proto;

pub use client::*;
pub use grpc::*;
