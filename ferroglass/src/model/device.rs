//! Devices and how to reach them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use serde::Serialize;

use super::AddressFamily;
use crate::platform::PlatformFamily;
use crate::transport::AuthMethod;

/// Login credentials for a device or jump host.
#[derive(Debug)]
pub struct Credential {
    /// Credential name, as referenced from configuration.
    pub name: String,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,
}

impl Credential {
    /// Create a credential.
    pub fn new(name: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            auth,
        }
    }
}

/// An intermediary SSH endpoint used to reach devices.
#[derive(Debug)]
pub struct JumpHost {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub credential: Arc<Credential>,
}

/// A VRF served by a device, with optional source addresses for
/// ping/traceroute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVrf {
    pub name: String,
    pub source_v4: Option<Ipv4Addr>,
    pub source_v6: Option<Ipv6Addr>,
}

impl DeviceVrf {
    /// A VRF membership without source addresses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_v4: None,
            source_v6: None,
        }
    }
}

/// A router the looking glass can run commands on.
///
/// Immutable after configuration load.
#[derive(Debug)]
pub struct Device {
    /// Unique name, used in requests.
    pub name: String,

    /// Name shown to users.
    pub display_name: String,

    /// Hostname or IP address used to connect.
    pub address: String,

    /// SSH port.
    pub port: u16,

    /// Platform family, selecting command syntax and output parsers.
    pub platform: PlatformFamily,

    /// Optional group (site, region) for display.
    pub group: Option<String>,

    /// Credentials for the device itself.
    pub credential: Arc<Credential>,

    /// Jump host to connect through.
    pub jump_host: Option<Arc<JumpHost>>,

    /// VRFs this device serves.
    pub vrfs: Vec<DeviceVrf>,

    /// Parse output into structured results; raw text when off.
    pub structured_output: bool,
}

impl Device {
    /// Create a device on port 22 with no VRFs.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        platform: PlatformFamily,
        credential: Arc<Credential>,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            address: address.into(),
            port: 22,
            platform,
            group: None,
            credential,
            jump_host: None,
            vrfs: vec![],
            structured_output: true,
        }
    }

    /// Add a VRF membership.
    pub fn with_vrf(mut self, vrf: DeviceVrf) -> Self {
        self.vrfs.push(vrf);
        self
    }

    /// Set the jump host.
    pub fn with_jump_host(mut self, jump_host: Arc<JumpHost>) -> Self {
        self.jump_host = Some(jump_host);
        self
    }

    /// Return raw output instead of structured results.
    pub fn with_raw_output(mut self) -> Self {
        self.structured_output = false;
        self
    }

    /// Whether this device serves the named VRF.
    pub fn serves(&self, vrf: &str) -> bool {
        self.vrfs.iter().any(|v| v.name == vrf)
    }

    /// Source address configured for a VRF and target family.
    ///
    /// Hostname targets (no family) use the IPv4 source.
    pub fn source_address(&self, vrf: &str, family: Option<AddressFamily>) -> Option<IpAddr> {
        let membership = self.vrfs.iter().find(|v| v.name == vrf)?;
        match family {
            Some(AddressFamily::Ipv6) => membership.source_v6.map(IpAddr::V6),
            Some(AddressFamily::Ipv4) | None => membership.source_v4.map(IpAddr::V4),
        }
    }

    /// API-facing view: no address or credentials.
    pub fn view(&self) -> DeviceView {
        DeviceView {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            platform: self.platform.as_str().to_string(),
            group: self.group.clone(),
            vrfs: self.vrfs.iter().map(|v| v.name.clone()).collect(),
        }
    }
}

/// Public description of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceView {
    pub name: String,
    pub display_name: String,
    pub platform: String,
    pub group: Option<String>,
    pub vrfs: Vec<String>,
}
