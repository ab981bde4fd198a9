//! rbln-daemon query interface
//!
//! The collector only ever needs two questions answered by the daemon, so
//! the boundary is a connector that opens a session and a session that
//! answers them. Test doubles implement the same pair.

use crate::device::Device;
use crate::error::Result;
use async_trait::async_trait;

/// Opens sessions to a device-management service
#[async_trait]
pub trait DaemonConnector: Send + Sync {
    /// Endpoint this connector talks to, for logging
    fn endpoint(&self) -> &str;

    /// Open a session. Connection setup is bounded by the connector's own
    /// timeout; the session is released when dropped.
    async fn connect(&self) -> Result<Box<dyn DaemonSession>>;
}

/// An open connection to the device-management service
#[async_trait]
pub trait DaemonSession: Send {
    /// Devices eligible for scheduling, in daemon order
    async fn serviceable_devices(&mut self) -> Result<Vec<Device>>;

    /// Raw driver version string reported for a device
    async fn version(&mut self, device: &Device) -> Result<String>;
}
