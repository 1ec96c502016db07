//! Device session adapters.
//!
//! The dispatch core only knows [`DeviceSession`]: run these commands on
//! this device within this time, give back one output per command or one of
//! the four [`DeviceError`] kinds. How the session is established (SSH,
//! jump host, canned output) stays behind the trait.

pub mod fake;
mod ssh;

pub use fake::FakeSession;
pub use ssh::{SshOptions, SshSessionAdapter};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeviceError;
use crate::model::Device;

/// Executes commands on a device.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Run `commands` in order on one session to `device`.
    ///
    /// Returns one output per command, in command order. Implementations
    /// should give up after roughly `timeout` with [`DeviceError::Timeout`];
    /// the caller enforces its own deadline regardless.
    async fn execute(
        &self,
        device: &Device,
        commands: &[String],
        timeout: Duration,
    ) -> Result<Vec<String>, DeviceError>;
}
