//! YAML configuration.
//!
//! ```yaml
//! credentials:
//!   - name: lg
//!     username: looking-glass
//!     password: secret
//! jump_hosts:
//!   - name: bastion
//!     address: 198.51.100.10
//!     credential: lg
//! vrfs:
//!   - name: default
//!     display_name: Global
//!     default_action: permit
//!     rules:
//!       - network: 10.0.0.0/8
//!         action: deny
//! devices:
//!   - name: mx1
//!     address: 192.0.2.1
//!     platform: juniper
//!     credential: lg
//!     jump_host: bastion
//!     vrfs:
//!       - name: default
//!         source_v4: 192.0.2.1
//! cache:
//!   timeout: 120
//! dispatch:
//!   timeout: 90
//!   device_timeout: 60
//! ```
//!
//! Durations are in seconds. [`Config::validate`] checks names and
//! references; [`Config::into_directory`] builds the immutable device and
//! VRF tables the looking glass reads.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::cache::CacheConfig;
use crate::dispatch::DispatchConfig;
use crate::error::ConfigError;
use crate::glass::Directory;
use crate::model::{Credential, Device, DeviceVrf, JumpHost, QueryType, Vrf};
use crate::platform::PlatformFamily;
use crate::policy::{Action, Rule};
use crate::session::SshOptions;
use crate::transport::AuthMethod;

/// Deserialize a duration given in (possibly fractional) seconds.
pub(crate) fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Whole looking-glass configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,

    #[serde(default)]
    pub jump_hosts: Vec<JumpHostConfig>,

    #[serde(default)]
    pub vrfs: Vec<VrfConfig>,

    pub devices: Vec<DeviceConfig>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub ssh: SshOptions,
}

/// Login credentials.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    pub name: String,
    pub username: String,
    pub password: Option<String>,

    /// Private key file.
    pub key: Option<PathBuf>,
    pub passphrase: Option<String>,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key", &self.key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

/// SSH jump host.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JumpHostConfig {
    pub name: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub credential: String,
}

/// VRF and its policy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VrfConfig {
    pub name: String,
    pub display_name: Option<String>,

    /// Enabled query types; all when omitted.
    pub query_types: Option<Vec<QueryType>>,

    #[serde(default = "default_action")]
    pub default_action: Action,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One access-control rule. Exactly one of `network`, `exact` and
/// `pattern` must be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub network: Option<String>,
    pub exact: Option<String>,
    pub pattern: Option<String>,
    pub action: Action,

    /// Minimum target prefix length for `network` rules.
    pub ge: Option<u8>,

    /// Maximum target prefix length for `network` rules.
    pub le: Option<u8>,

    /// Query types the rule applies to; all when omitted.
    pub query_types: Option<Vec<QueryType>>,
}

/// A router.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,
    pub display_name: Option<String>,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub platform: String,
    pub group: Option<String>,
    pub credential: String,
    pub jump_host: Option<String>,
    pub vrfs: Vec<DeviceVrfConfig>,

    /// Parse command output; `false` returns raw text.
    #[serde(default = "default_structured_output")]
    pub structured_output: bool,
}

/// A device's membership in a VRF.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceVrfConfig {
    pub name: String,
    pub source_v4: Option<Ipv4Addr>,
    pub source_v6: Option<Ipv6Addr>,
}

fn default_port() -> u16 {
    22
}

fn default_structured_output() -> bool {
    true
}

fn default_action() -> Action {
    Action::Permit
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn unknown(kind: &'static str, name: &str, referenced_by: String) -> ConfigError {
    ConfigError::UnknownReference {
        kind,
        name: name.to_string(),
        referenced_by,
    }
}

impl Config {
    /// Parse a YAML document. Does not validate.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file. Does not validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check names, references, platforms, credentials and rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unique("credential", self.credentials.iter().map(|c| c.name.as_str()))?;
        check_unique("jump host", self.jump_hosts.iter().map(|j| j.name.as_str()))?;
        check_unique("VRF", self.vrfs.iter().map(|v| v.name.as_str()))?;
        check_unique("device", self.devices.iter().map(|d| d.name.as_str()))?;

        for credential in &self.credentials {
            credential.auth_method()?;
        }

        let credentials: HashSet<&str> = self.credentials.iter().map(|c| c.name.as_str()).collect();
        let jump_hosts: HashSet<&str> = self.jump_hosts.iter().map(|j| j.name.as_str()).collect();
        let vrfs: HashSet<&str> = self.vrfs.iter().map(|v| v.name.as_str()).collect();

        for jump in &self.jump_hosts {
            if !credentials.contains(jump.credential.as_str()) {
                return Err(unknown(
                    "credential",
                    &jump.credential,
                    format!("jump host '{}'", jump.name),
                ));
            }
        }

        for vrf in &self.vrfs {
            for rule in &vrf.rules {
                rule.to_rule(&vrf.name)?;
            }
        }

        for device in &self.devices {
            let referenced_by = || format!("device '{}'", device.name);
            device.platform.parse::<PlatformFamily>()?;
            if !credentials.contains(device.credential.as_str()) {
                return Err(unknown("credential", &device.credential, referenced_by()));
            }
            if let Some(jump) = &device.jump_host {
                if !jump_hosts.contains(jump.as_str()) {
                    return Err(unknown("jump host", jump, referenced_by()));
                }
            }
            check_unique(
                "VRF membership",
                device.vrfs.iter().map(|v| v.name.as_str()),
            )?;
            for membership in &device.vrfs {
                if !vrfs.contains(membership.name.as_str()) {
                    return Err(unknown("VRF", &membership.name, referenced_by()));
                }
            }
        }

        Ok(())
    }

    /// Validate and build the device and VRF tables.
    pub fn into_directory(self) -> Result<Directory, ConfigError> {
        self.validate()?;

        let mut credentials = HashMap::new();
        for credential in self.credentials {
            let auth = credential.auth_method()?;
            credentials.insert(
                credential.name.clone(),
                Arc::new(Credential::new(credential.name, credential.username, auth)),
            );
        }
        let credential = |name: &str, referenced_by: String| {
            credentials
                .get(name)
                .cloned()
                .ok_or_else(|| unknown("credential", name, referenced_by))
        };

        let mut jump_hosts = HashMap::new();
        for jump in self.jump_hosts {
            let host = JumpHost {
                credential: credential(&jump.credential, format!("jump host '{}'", jump.name))?,
                name: jump.name.clone(),
                address: jump.address,
                port: jump.port,
            };
            jump_hosts.insert(jump.name, Arc::new(host));
        }

        let mut directory = Directory::new();
        for vrf in self.vrfs {
            directory = directory.with_vrf(vrf.into_vrf()?)?;
        }

        for config in self.devices {
            let referenced_by = format!("device '{}'", config.name);
            let mut device = Device::new(
                config.name.clone(),
                config.address,
                config.platform.parse()?,
                credential(&config.credential, referenced_by.clone())?,
            );
            device.port = config.port;
            device.group = config.group;
            device.structured_output = config.structured_output;
            if let Some(display_name) = config.display_name {
                device.display_name = display_name;
            }
            if let Some(jump) = &config.jump_host {
                let host = jump_hosts
                    .get(jump)
                    .cloned()
                    .ok_or_else(|| unknown("jump host", jump, referenced_by.clone()))?;
                device = device.with_jump_host(host);
            }
            for membership in config.vrfs {
                device = device.with_vrf(DeviceVrf {
                    name: membership.name,
                    source_v4: membership.source_v4,
                    source_v6: membership.source_v6,
                });
            }
            directory = directory.with_device(device)?;
        }

        Ok(directory)
    }
}

impl CredentialConfig {
    fn auth_method(&self) -> Result<AuthMethod, ConfigError> {
        match (&self.password, &self.key) {
            (Some(password), None) => Ok(AuthMethod::password(password.clone())),
            (None, Some(key)) => Ok(AuthMethod::private_key(key.clone(), self.passphrase.clone())),
            (Some(_), Some(_)) => Err(ConfigError::InvalidCredential {
                name: self.name.clone(),
                message: "set either password or key, not both".to_string(),
            }),
            (None, None) => Err(ConfigError::InvalidCredential {
                name: self.name.clone(),
                message: "no password or key".to_string(),
            }),
        }
    }
}

impl VrfConfig {
    fn into_vrf(self) -> Result<Vrf, ConfigError> {
        let mut vrf = Vrf::new(self.name.clone()).with_default_action(self.default_action);
        if let Some(display_name) = self.display_name {
            vrf = vrf.with_display_name(display_name);
        }
        if let Some(query_types) = self.query_types {
            vrf = vrf.with_query_types(query_types);
        }
        for rule in &self.rules {
            vrf = vrf.with_rule(rule.to_rule(&self.name)?);
        }
        Ok(vrf)
    }
}

impl RuleConfig {
    fn to_rule(&self, vrf: &str) -> Result<Rule, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidRule {
            vrf: vrf.to_string(),
            message,
        };

        let rule = match (&self.network, &self.exact, &self.pattern) {
            (Some(network), None, None) => Rule::network(network, self.action)
                .map_err(invalid)?
                .with_length_range(self.ge, self.le),
            (None, Some(value), None) => Rule::exact(value.clone(), self.action),
            (None, None, Some(pattern)) => {
                Rule::pattern(pattern, self.action).map_err(|e| invalid(e.to_string()))?
            }
            _ => {
                return Err(invalid(
                    "a rule needs exactly one of network, exact or pattern".to_string(),
                ));
            }
        };

        if self.network.is_none() && (self.ge.is_some() || self.le.is_some()) {
            return Err(invalid("ge/le only apply to network rules".to_string()));
        }

        Ok(match &self.query_types {
            Some(types) => rule.for_query_types(types.iter().copied()),
            None => rule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HostKeyVerification;

    const YAML: &str = r#"
credentials:
  - name: lg
    username: looking-glass
    password: secret
  - name: keyed
    username: lg
    key: /etc/lg/id_ed25519
jump_hosts:
  - name: bastion
    address: 198.51.100.10
    credential: keyed
vrfs:
  - name: default
    display_name: Global
    rules:
      - network: 10.0.0.0/8
        action: deny
      - exact: "65000:666"
        action: deny
        query_types: [bgp_community]
  - name: customer-a
    query_types: [bgp_route, ping]
    default_action: deny
    rules:
      - network: 203.0.113.0/24
        le: 32
        action: permit
devices:
  - name: mx1
    display_name: Amsterdam MX
    address: 192.0.2.1
    platform: junos
    group: ams
    credential: lg
    jump_host: bastion
    vrfs:
      - name: default
        source_v4: 192.0.2.1
        source_v6: "2001:db8::1"
      - name: customer-a
  - name: rtr2
    address: 192.0.2.2
    port: 2222
    platform: cisco_ios
    credential: lg
    structured_output: false
    vrfs:
      - name: default
cache:
  timeout: 60
  max_entries: 100
dispatch:
  timeout: 30
  device_timeout: 12.5
ssh:
  host_key_verification: strict
"#;

    #[test]
    fn test_parse_and_build_directory() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert_eq!(config.cache.timeout, Duration::from_secs(60));
        assert_eq!(config.dispatch.device_timeout, Duration::from_millis(12_500));
        assert_eq!(config.ssh.host_key_verification, HostKeyVerification::Strict);
        assert!(config.cache.refresh_on_hit);

        let directory = config.into_directory().unwrap();
        let mx1 = directory.device("mx1").unwrap();
        assert_eq!(mx1.platform, PlatformFamily::Juniper);
        assert_eq!(mx1.display_name, "Amsterdam MX");
        assert_eq!(mx1.jump_host.as_ref().unwrap().name, "bastion");
        assert_eq!(mx1.jump_host.as_ref().unwrap().credential.username, "lg");
        assert_eq!(mx1.vrfs.len(), 2);
        assert_eq!(mx1.vrfs[0].source_v6, Some("2001:db8::1".parse().unwrap()));

        let rtr2 = directory.device("rtr2").unwrap();
        assert_eq!(rtr2.port, 2222);
        assert_eq!(rtr2.display_name, "rtr2");
        assert!(rtr2.jump_host.is_none());
        assert!(!rtr2.structured_output);
        assert!(mx1.structured_output);

        let customer = directory.vrf("customer-a").unwrap();
        assert_eq!(customer.default_action, Action::Deny);
        assert!(!customer.enables(QueryType::Traceroute));
        assert_eq!(directory.vrf("default").unwrap().rules.len(), 2);
    }

    #[test]
    fn test_sample_config() {
        let config = Config::from_yaml_str(include_str!("../examples/lg.yaml")).unwrap();
        let directory = config.into_directory().unwrap();
        assert_eq!(directory.devices().count(), 3);
        assert_eq!(directory.device("rtr2").unwrap().jump_host.as_ref().unwrap().name, "bastion");
        assert_eq!(directory.vrf("default").unwrap().rules.len(), 4);
    }

    #[test]
    fn test_credentials_not_in_debug_output() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }

    fn minimal(devices: &str) -> String {
        format!(
            "credentials:\n  - name: lg\n    username: lg\n    password: pw\nvrfs:\n  - name: default\ndevices:\n{devices}"
        )
    }

    #[test]
    fn test_duplicate_device() {
        let yaml = minimal(
            "  - {name: r1, address: 192.0.2.1, platform: frr, credential: lg, vrfs: [{name: default}]}\n  - {name: r1, address: 192.0.2.2, platform: frr, credential: lg, vrfs: [{name: default}]}\n",
        );
        let err = Config::from_yaml_str(&yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "device", .. }));
    }

    #[test]
    fn test_unknown_references() {
        let yaml = minimal(
            "  - {name: r1, address: 192.0.2.1, platform: frr, credential: lg, vrfs: [{name: customer-z}]}\n",
        );
        let err = Config::from_yaml_str(&yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference { kind: "VRF", .. }));

        let yaml = minimal(
            "  - {name: r1, address: 192.0.2.1, platform: frr, credential: nope, vrfs: [{name: default}]}\n",
        );
        let err = Config::from_yaml_str(&yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference { kind: "credential", .. }));

        let yaml = minimal(
            "  - {name: r1, address: 192.0.2.1, platform: frr, credential: lg, jump_host: nope, vrfs: [{name: default}]}\n",
        );
        let err = Config::from_yaml_str(&yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference { kind: "jump host", .. }));
    }

    #[test]
    fn test_unknown_platform() {
        let yaml = minimal(
            "  - {name: r1, address: 192.0.2.1, platform: vendor-x, credential: lg, vrfs: [{name: default}]}\n",
        );
        let err = Config::from_yaml_str(&yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlatform { .. }));
    }

    #[test]
    fn test_invalid_rules() {
        let rule = RuleConfig {
            network: Some("10.0.0.0/33".to_string()),
            exact: None,
            pattern: None,
            action: Action::Deny,
            ge: None,
            le: None,
            query_types: None,
        };
        assert!(matches!(rule.to_rule("default"), Err(ConfigError::InvalidRule { .. })));

        let rule = RuleConfig {
            network: Some("10.0.0.0/8".to_string()),
            exact: Some("65000:1".to_string()),
            ..rule
        };
        assert!(matches!(rule.to_rule("default"), Err(ConfigError::InvalidRule { .. })));

        let rule = RuleConfig {
            network: None,
            exact: None,
            pattern: Some("^(65000".to_string()),
            ..rule
        };
        assert!(matches!(rule.to_rule("default"), Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn test_credential_needs_one_method() {
        let yaml = "credentials:\n  - name: lg\n    username: lg\nvrfs: []\ndevices: []\n";
        let err = Config::from_yaml_str(yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCredential { .. }));
    }

    #[test]
    fn test_yaml_errors() {
        assert!(matches!(
            Config::from_yaml_str("devices: [}"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            Config::from_path("/nonexistent/ferroglass.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
