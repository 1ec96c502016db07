//! Supported platform families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Device operating-system family.
///
/// Selects command syntax, prompt handling and output parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFamily {
    Juniper,
    AristaEos,
    CiscoIos,
    CiscoXr,
    Frr,
    Bird,
}

impl PlatformFamily {
    /// All built-in families.
    pub const ALL: [PlatformFamily; 6] = [
        PlatformFamily::Juniper,
        PlatformFamily::AristaEos,
        PlatformFamily::CiscoIos,
        PlatformFamily::CiscoXr,
        PlatformFamily::Frr,
        PlatformFamily::Bird,
    ];

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Juniper => "juniper",
            PlatformFamily::AristaEos => "arista_eos",
            PlatformFamily::CiscoIos => "cisco_ios",
            PlatformFamily::CiscoXr => "cisco_xr",
            PlatformFamily::Frr => "frr",
            PlatformFamily::Bird => "bird",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = ConfigError;

    /// Parse a family name, accepting common aliases (`junos`, `eos`,
    /// `iosxr`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "juniper" | "junos" | "juniper_junos" => Ok(PlatformFamily::Juniper),
            "arista_eos" | "arista" | "eos" => Ok(PlatformFamily::AristaEos),
            "cisco_ios" | "ios" | "cisco_iosxe" | "iosxe" => Ok(PlatformFamily::CiscoIos),
            "cisco_xr" | "iosxr" | "cisco_iosxr" => Ok(PlatformFamily::CiscoXr),
            "frr" | "frrouting" => Ok(PlatformFamily::Frr),
            "bird" | "bird2" => Ok(PlatformFamily::Bird),
            _ => Err(ConfigError::UnknownPlatform {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("junos".parse::<PlatformFamily>().unwrap(), PlatformFamily::Juniper);
        assert_eq!("EOS".parse::<PlatformFamily>().unwrap(), PlatformFamily::AristaEos);
        assert_eq!("cisco_iosxe".parse::<PlatformFamily>().unwrap(), PlatformFamily::CiscoIos);
        assert_eq!("iosxr".parse::<PlatformFamily>().unwrap(), PlatformFamily::CiscoXr);
        assert_eq!("bird2".parse::<PlatformFamily>().unwrap(), PlatformFamily::Bird);
    }

    #[test]
    fn test_unknown_platform() {
        let err = "nxos".parse::<PlatformFamily>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlatform { name } if name == "nxos"));
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for family in PlatformFamily::ALL {
            assert_eq!(family.as_str().parse::<PlatformFamily>().unwrap(), family);
        }
    }
}
