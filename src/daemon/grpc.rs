//! gRPC transport to rbln-daemon
//!
//! Hand-written tonic client for the two `rblnservices.RBLNServices`
//! RPCs the collector uses, plus the connector/session pair built on it.

use super::client::{DaemonConnector, DaemonSession};
use super::proto;
use crate::device::Device;
use crate::error::{FeatureDiscoveryError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

/// Default rbln-daemon endpoint
pub const DEFAULT_DAEMON_ENDPOINT: &str = "http://127.0.0.1:50051";

/// Upper bound on establishing the daemon connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const GET_SERVICEABLE_DEVICE_LIST: &str = "/rblnservices.RBLNServices/GetServiceableDeviceList";
const GET_VERSION: &str = "/rblnservices.RBLNServices/GetVersion";

/// Typed client for the rblnservices API
#[derive(Clone)]
pub struct RblnServicesClient {
    inner: tonic::client::Grpc<Channel>,
}

impl RblnServicesClient {
    /// Wrap an established channel
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Server-streaming list of serviceable devices
    pub async fn get_serviceable_device_list(
        &mut self,
        request: proto::Empty,
    ) -> std::result::Result<tonic::Response<tonic::codec::Streaming<proto::Device>>, tonic::Status>
    {
        self.ready().await?;
        let codec = tonic_prost::ProstCodec::default();
        let path = PathAndQuery::from_static(GET_SERVICEABLE_DEVICE_LIST);
        self.inner
            .server_streaming(tonic::Request::new(request), path, codec)
            .await
    }

    /// Driver version for a single device
    pub async fn get_version(
        &mut self,
        request: proto::Device,
    ) -> std::result::Result<tonic::Response<proto::VersionInfo>, tonic::Status> {
        self.ready().await?;
        let codec = tonic_prost::ProstCodec::default();
        let path = PathAndQuery::from_static(GET_VERSION);
        self.inner
            .unary(tonic::Request::new(request), path, codec)
            .await
    }

    async fn ready(&mut self) -> std::result::Result<(), tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("service was not ready: {}", e)))
    }
}

/// Connects to rbln-daemon over gRPC
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    endpoint: String,
    connect_timeout: Duration,
}

impl GrpcConnector {
    /// Create a connector for an endpoint URL (`http://host:port`)
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for GrpcConnector {
    fn default() -> Self {
        Self::new(DEFAULT_DAEMON_ENDPOINT)
    }
}

#[async_trait]
impl DaemonConnector for GrpcConnector {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self) -> Result<Box<dyn DaemonSession>> {
        let endpoint = Endpoint::from_shared(self.endpoint.clone())
            .map_err(|e| FeatureDiscoveryError::transport(&self.endpoint, describe(&e)))?
            .connect_timeout(self.connect_timeout);

        let channel = tokio::time::timeout(self.connect_timeout, endpoint.connect())
            .await
            .map_err(|_| {
                FeatureDiscoveryError::transport(
                    &self.endpoint,
                    format!("connect timed out after {:?}", self.connect_timeout),
                )
            })?
            .map_err(|e| FeatureDiscoveryError::transport(&self.endpoint, describe(&e)))?;

        tracing::debug!("Connected to rbln-daemon at {}", self.endpoint);

        Ok(Box::new(GrpcSession {
            endpoint: self.endpoint.clone(),
            client: RblnServicesClient::new(channel),
        }))
    }
}

/// One connection to rbln-daemon; the channel closes on drop
struct GrpcSession {
    endpoint: String,
    client: RblnServicesClient,
}

#[async_trait]
impl DaemonSession for GrpcSession {
    async fn serviceable_devices(&mut self) -> Result<Vec<Device>> {
        let mut stream = self
            .client
            .get_serviceable_device_list(proto::Empty {})
            .await
            .map_err(|status| rpc_error(&self.endpoint, "GetServiceableDeviceList", status))?
            .into_inner();

        let mut devices = Vec::new();
        while let Some(device) = stream
            .message()
            .await
            .map_err(|status| rpc_error(&self.endpoint, "GetServiceableDeviceList", status))?
        {
            devices.push(Device::from(&device));
        }

        Ok(devices)
    }

    async fn version(&mut self, device: &Device) -> Result<String> {
        let request = proto::Device::from(device);

        let response = self
            .client
            .get_version(request)
            .await
            .map_err(|status| rpc_error(&self.endpoint, "GetVersion", status))?;

        Ok(response.into_inner().drv_version)
    }
}

fn rpc_error(endpoint: &str, rpc: &str, status: tonic::Status) -> FeatureDiscoveryError {
    if status.code() == tonic::Code::Unimplemented {
        tracing::debug!("{} is not implemented by rbln-daemon", rpc);
    } else {
        tracing::error!("{} failed: {}", rpc, status);
    }
    FeatureDiscoveryError::transport(endpoint, format!("{} RPC failed: {}", rpc, status))
}

/// Flatten an error and its sources into one line
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_endpoint_is_transport_error() {
        let connector = GrpcConnector::new("not a uri");
        match connector.connect().await {
            Err(FeatureDiscoveryError::Transport { endpoint, .. }) => {
                assert_eq!(endpoint, "not a uri")
            }
            Err(other) => panic!("expected transport error, got {}", other),
            Ok(_) => panic!("expected transport error"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_transport_error() {
        // Bind then drop to get a local port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = GrpcConnector::new(format!("http://{}", addr))
            .with_connect_timeout(Duration::from_secs(2));
        assert!(matches!(
            connector.connect().await,
            Err(FeatureDiscoveryError::Transport { .. })
        ));
    }

    #[test]
    fn test_rpc_error_names_the_call() {
        let err = rpc_error(
            "http://127.0.0.1:50051",
            "GetVersion",
            tonic::Status::unavailable("daemon restarting"),
        );
        let message = err.to_string();
        assert!(message.contains("GetVersion"));
        assert!(message.contains("daemon restarting"));
    }
}
