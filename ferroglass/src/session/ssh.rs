//! SSH-backed device sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use super::DeviceSession;
use crate::driver::{DeviceDriver, Response};
use crate::error::DeviceError;
use crate::model::Device;
use crate::platform::PlatformRegistry;
use crate::transport::{HostKeyVerification, SshConfig};

/// SSH settings shared by every device connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SshOptions {
    /// Upper bound on connecting and authenticating, in seconds.
    #[serde(deserialize_with = "crate::config::seconds")]
    pub connect_timeout: Duration,

    pub host_key_verification: HostKeyVerification,

    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

impl SshOptions {
    fn apply(&self, config: SshConfig, timeout: Duration) -> SshConfig {
        let config = config
            .with_timeout(self.connect_timeout.min(timeout))
            .with_host_key_verification(self.host_key_verification);
        match &self.known_hosts_path {
            Some(path) => config.with_known_hosts_path(path.clone()),
            None => config,
        }
    }
}

/// Runs commands over an interactive SSH session, one connection per call.
#[derive(Debug, Clone)]
pub struct SshSessionAdapter {
    registry: Arc<PlatformRegistry>,
    options: SshOptions,
}

impl SshSessionAdapter {
    /// Create an adapter over a platform registry.
    pub fn new(registry: Arc<PlatformRegistry>) -> Self {
        Self {
            registry,
            options: SshOptions::default(),
        }
    }

    /// Set the SSH options.
    pub fn with_options(mut self, options: SshOptions) -> Self {
        self.options = options;
        self
    }

    fn driver(&self, device: &Device, timeout: Duration) -> Result<DeviceDriver, DeviceError> {
        let platform = self
            .registry
            .get(device.platform)
            .ok_or_else(|| DeviceError::CommandError {
                message: format!("no platform definition for '{}'", device.platform),
            })?;

        let config = self.options.apply(SshConfig::for_device(device), timeout);
        let driver = DeviceDriver::new(config, Arc::clone(platform)).with_timeout(timeout);

        Ok(match &device.jump_host {
            Some(jump) => {
                debug!("{}: connecting via jump host {}", device.name, jump.name);
                driver.with_jump_host(self.options.apply(SshConfig::for_jump_host(jump), timeout))
            }
            None => driver,
        })
    }
}

#[async_trait]
impl DeviceSession for SshSessionAdapter {
    async fn execute(
        &self,
        device: &Device,
        commands: &[String],
        timeout: Duration,
    ) -> Result<Vec<String>, DeviceError> {
        let mut driver = self.driver(device, timeout)?;

        if let Err(e) = driver.open().await {
            warn!("{}: could not open session: {}", device.name, e);
            if let Err(close_err) = driver.close().await {
                debug!("{}: close after failed open: {}", device.name, close_err);
            }
            return Err(e.into());
        }

        let sent = driver.send_commands(commands).await;
        if let Err(e) = driver.close().await {
            debug!("{}: close: {}", device.name, e);
        }

        sent.map_err(DeviceError::from)?
            .into_iter()
            .map(Response::into_output)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Credential, JumpHost};
    use crate::platform::PlatformFamily;
    use crate::transport::AuthMethod;

    #[test]
    fn test_options_bound_the_connect_timeout() {
        let options = SshOptions {
            connect_timeout: Duration::from_secs(10),
            host_key_verification: HostKeyVerification::Strict,
            known_hosts_path: Some("/var/lib/lg/known_hosts".into()),
        };
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        let device = Device::new("r1", "192.0.2.1", PlatformFamily::CiscoIos, credential);

        let config = options.apply(SshConfig::for_device(&device), Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.host_key_verification, HostKeyVerification::Strict);
        assert_eq!(config.known_hosts_path, Some(PathBuf::from("/var/lib/lg/known_hosts")));

        let config = options.apply(SshConfig::for_device(&device), Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_driver_uses_jump_host_and_platform() {
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        let jump = Arc::new(JumpHost {
            name: "bastion".to_string(),
            address: "198.51.100.10".to_string(),
            port: 22,
            credential: credential.clone(),
        });
        let device = Device::new("r1", "192.0.2.1", PlatformFamily::Juniper, credential)
            .with_jump_host(jump);

        let adapter = SshSessionAdapter::new(PlatformRegistry::builtin());
        let driver = adapter.driver(&device, Duration::from_secs(5)).unwrap();
        assert_eq!(driver.platform().family, PlatformFamily::Juniper);
        assert!(!driver.is_open());

        let empty = SshSessionAdapter::new(Arc::new(PlatformRegistry::new()));
        assert!(matches!(
            empty.driver(&device, Duration::from_secs(5)),
            Err(DeviceError::CommandError { .. })
        ));
    }

    #[test]
    fn test_options_from_yaml() {
        let options: SshOptions =
            serde_yaml::from_str("connect_timeout: 4\nhost_key_verification: disabled\n").unwrap();
        assert_eq!(options.connect_timeout, Duration::from_secs(4));
        assert_eq!(options.host_key_verification, HostKeyVerification::Disabled);
        assert_eq!(options.known_hosts_path, None);
    }
}
