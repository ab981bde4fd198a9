//! Error types for rbln-npu-feature-discovery
//!
//! One error enum covers every failure a collection cycle can hit. The
//! collector decides from the variant whether a failure is a reason to
//! fall back to sysfs or a reason to abandon the cycle.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for feature discovery operations
#[derive(Error, Debug)]
pub enum FeatureDiscoveryError {
    /// rbln-daemon unreachable or an RPC failed
    #[error("transport error talking to rbln-daemon at '{endpoint}': {message}")]
    Transport {
        /// Daemon endpoint URL
        endpoint: String,
        /// What went wrong
        message: String,
    },

    /// Raw device id not present in the product table
    #[error("unknown device id: {0}")]
    UnknownDevice(String),

    /// Product code with a prefix that maps to no family
    #[error("unknown product name: {0}")]
    UnknownFamily(String),

    /// Driver version string without major.minor.patch
    #[error("failed to split semver with dots: {0}")]
    MalformedVersion(String),

    /// Unexpected failure reading kernel-exposed attributes
    #[error("sysfs I/O error at '{path}': {source}")]
    Sysfs {
        /// Attribute or directory being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the label file failed
    #[error("failed to publish features at '{path}': {source}")]
    Publish {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Output path has no usable file name
    #[error("invalid output file path: {0}")]
    InvalidOutputPath(PathBuf),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A blocking I/O task panicked or was aborted
    #[error("task error: {0}")]
    Task(String),

    /// Collection cycle cancelled by shutdown
    #[error("operation cancelled")]
    Cancelled,
}

impl FeatureDiscoveryError {
    /// Create a transport error for a daemon endpoint
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a sysfs error with path context
    pub fn sysfs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Sysfs {
            path: path.into(),
            source,
        }
    }

    /// Create a publish error with path context
    pub fn publish(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Publish {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }

    /// True for the shutdown path, which must never fall back or publish
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True when the error came from the data a source returned rather
    /// than from reaching the source
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownDevice(_) | Self::UnknownFamily(_) | Self::MalformedVersion(_)
        )
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Sysfs { path, .. }
            | Self::Publish { path, .. }
            | Self::InvalidOutputPath(path) => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for feature discovery operations
pub type Result<T> = std::result::Result<T, FeatureDiscoveryError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Tag an I/O error as a sysfs read failure
    fn with_sysfs_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Tag an I/O error as a publish failure
    fn with_publish_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_sysfs_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| FeatureDiscoveryError::sysfs(path, e))
    }

    fn with_publish_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| FeatureDiscoveryError::publish(path, e))
    }
}
