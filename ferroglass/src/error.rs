//! Error types for ferroglass.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QueryType;

/// Main error type for ferroglass operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Per-query rejections (no device is contacted)
    #[error("Query rejected: {0}")]
    Query(#[from] QueryError),

    /// Per-device execution errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error rejects a whole query before any device is contacted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Query(_))
    }
}

/// Errors that reject a whole query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The target is not valid syntax for the query type.
    #[error("Invalid target '{target}' for {query_type}: {reason}")]
    InvalidTarget {
        query_type: QueryType,
        target: String,
        reason: String,
    },

    /// The access-control policy refused the query.
    #[error("Policy denied: {reason}")]
    PolicyDenied { reason: String },

    /// No command template exists for the platform and query type.
    #[error("Query type {query_type} is not supported on platform '{platform}'")]
    UnsupportedQuery {
        platform: String,
        query_type: QueryType,
    },

    /// A requested device is not configured.
    #[error("Unknown device '{name}'")]
    UnknownDevice { name: String },

    /// The request named no devices.
    #[error("No devices selected")]
    NoDevices,
}

/// Per-device failure recorded in a response envelope.
///
/// Never fatal to the envelope; siblings still report their own outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceError {
    /// Could not establish a session with the device.
    #[error("Device unreachable: {message}")]
    Unreachable { message: String },

    /// The device (or jump host) rejected our credentials.
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    /// The device did not answer in time.
    #[error("Timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The device answered with an error for the command.
    #[error("Command failed: {message}")]
    CommandError { message: String },
}

impl DeviceError {
    /// Build a timeout error from an elapsed duration.
    pub fn timeout(after: Duration) -> Self {
        DeviceError::Timeout {
            after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key is not present in known_hosts (strict mode)
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid YAML for the model
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two entries share a name
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    /// An entry references something that is not defined
    #[error("{referenced_by} references unknown {kind} '{name}'")]
    UnknownReference {
        kind: &'static str,
        name: String,
        referenced_by: String,
    },

    /// A device names a platform with no built-in definition
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A credential names no usable authentication method
    #[error("Invalid credential '{name}': {message}")]
    InvalidCredential { name: String, message: String },

    /// An access-control rule could not be compiled
    #[error("Invalid rule in VRF '{vrf}': {message}")]
    InvalidRule { vrf: String, message: String },
}

impl From<TransportError> for DeviceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::AuthenticationFailed { .. } | TransportError::Key(_) => {
                DeviceError::AuthFailure {
                    message: err.to_string(),
                }
            }
            TransportError::Timeout(after) => DeviceError::timeout(after),
            other => DeviceError::Unreachable {
                message: other.to_string(),
            },
        }
    }
}

impl From<ChannelError> for DeviceError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::PatternTimeout(after) => DeviceError::timeout(after),
            other => DeviceError::Unreachable {
                message: other.to_string(),
            },
        }
    }
}

impl From<Error> for DeviceError {
    fn from(err: Error) -> Self {
        match err {
            Error::Device(e) => e,
            Error::Transport(e) => e.into(),
            Error::Channel(e) => e.into(),
            other => DeviceError::CommandError {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using ferroglass's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_map_to_device_kinds() {
        let auth: DeviceError = TransportError::AuthenticationFailed {
            user: "lg".to_string(),
        }
        .into();
        assert!(matches!(auth, DeviceError::AuthFailure { .. }));

        let timeout: DeviceError = TransportError::Timeout(Duration::from_secs(3)).into();
        assert_eq!(timeout, DeviceError::Timeout { after_ms: 3000 });

        let refused: DeviceError = TransportError::ConnectionFailed {
            host: "192.0.2.1".to_string(),
            port: 22,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        }
        .into();
        assert!(matches!(refused, DeviceError::Unreachable { .. }));
    }

    #[test]
    fn test_channel_timeout_is_device_timeout() {
        let err: DeviceError = ChannelError::PatternTimeout(Duration::from_millis(1500)).into();
        assert_eq!(err, DeviceError::Timeout { after_ms: 1500 });
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::from(QueryError::NoDevices).is_fatal());
        assert!(
            !Error::from(DeviceError::CommandError {
                message: "syntax error".to_string()
            })
            .is_fatal()
        );
    }
}
