//! Parameterized command templates.
//!
//! Templates are plain data: a list of lines per VRF kind, each tagged with
//! the address family it applies to. Placeholders:
//!
//! - `{target}`: canonical target
//! - `{vrf}`: VRF name
//! - `{source}`: source address configured for the device in the VRF
//!
//! A line containing `{source}` is only emitted when a source address is
//! known; otherwise its sourceless alternative is used, if it has one.

use std::net::IpAddr;

use crate::model::{AddressFamily, Target, Vrf};

/// Address family a template line applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Afi {
    Any,
    Ipv4,
    Ipv6,
}

/// One command line of a template.
#[derive(Debug, Clone)]
pub struct TemplateLine {
    afi: Afi,
    text: String,
    sourceless: Option<String>,
}

impl TemplateLine {
    /// Line emitted for every target.
    pub fn any(text: impl Into<String>) -> Self {
        Self::with_afi(Afi::Any, text)
    }

    /// Line for IPv4 targets (and targets with no address family).
    pub fn ipv4(text: impl Into<String>) -> Self {
        Self::with_afi(Afi::Ipv4, text)
    }

    /// Line for IPv6 targets (and table-wide lookups).
    pub fn ipv6(text: impl Into<String>) -> Self {
        Self::with_afi(Afi::Ipv6, text)
    }

    fn with_afi(afi: Afi, text: impl Into<String>) -> Self {
        Self {
            afi,
            text: text.into(),
            sourceless: None,
        }
    }

    /// Alternative text when no source address is configured.
    pub fn or_without_source(mut self, text: impl Into<String>) -> Self {
        self.sourceless = Some(text.into());
        self
    }

    /// Address family of this line.
    pub fn afi(&self) -> Afi {
        self.afi
    }

    /// Whether this line is emitted for a target.
    ///
    /// Address targets pick lines of their own family. Community and
    /// AS-path lookups span both tables, so they take every line. Hostnames
    /// are resolved by the device and take the IPv4 lines.
    fn selected_for(&self, target: &Target) -> bool {
        match (self.afi, target) {
            (Afi::Any, _) => true,
            (afi, Target::Prefix(p)) => match p.family() {
                AddressFamily::Ipv4 => afi == Afi::Ipv4,
                AddressFamily::Ipv6 => afi == Afi::Ipv6,
            },
            (_, Target::Community(_) | Target::AsPath(_)) => true,
            (afi, Target::Hostname(_)) => afi == Afi::Ipv4,
        }
    }

    fn render(&self, target: &Target, vrf: &str, source: Option<IpAddr>) -> Option<String> {
        let text = match source {
            _ if !self.text.contains("{source}") => self.text.clone(),
            Some(addr) => self.text.replace("{source}", &addr.to_string()),
            None => self.sourceless.clone()?,
        };
        Some(
            text.replace("{target}", &target.to_string())
                .replace("{vrf}", vrf),
        )
    }
}

/// Command template for one (platform, query type) pair.
#[derive(Debug, Clone, Default)]
pub struct CommandTemplate {
    default_vrf: Vec<TemplateLine>,
    named_vrf: Vec<TemplateLine>,
}

impl CommandTemplate {
    /// Template with the lines used in the default VRF.
    ///
    /// Without [`with_named_vrf`](Self::with_named_vrf) these lines are used
    /// for every VRF.
    pub fn new(lines: impl IntoIterator<Item = TemplateLine>) -> Self {
        Self {
            default_vrf: lines.into_iter().collect(),
            named_vrf: vec![],
        }
    }

    /// Lines used in any VRF other than the default.
    pub fn with_named_vrf(mut self, lines: impl IntoIterator<Item = TemplateLine>) -> Self {
        self.named_vrf = lines.into_iter().collect();
        self
    }

    /// Render the commands for a target, in order.
    ///
    /// Returns an empty list when no line applies, for example an IPv6
    /// target on a template with only IPv4 lines.
    pub fn render(&self, target: &Target, vrf: &Vrf, source: Option<IpAddr>) -> Vec<String> {
        let lines = if vrf.is_default() || self.named_vrf.is_empty() {
            &self.default_vrf
        } else {
            &self.named_vrf
        };

        lines
            .iter()
            .filter(|line| line.selected_for(target))
            .filter_map(|line| line.render(target, &vrf.name, source))
            .collect()
    }
}
