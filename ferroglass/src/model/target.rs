//! Query targets and their type-specific syntax.
//!
//! Every target is parsed into a canonical form before it reaches the
//! policy engine or a command template. Canonical forms are what make
//! equivalent queries collide in the cache (`10.0.0.1` and `10.0.0.1/32`,
//! `2001:DB8::1` and `2001:db8::1`, `NO-EXPORT` and `no-export`), and the
//! restricted character sets keep targets safe to interpolate into CLI
//! commands.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use regex::Regex;

use super::QueryType;
use crate::error::QueryError;

/// IP address family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// An IP network with host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    addr: IpAddr,
    len: u8,
}

impl Prefix {
    /// Create a prefix, masking host bits. Returns `None` if `len` is too long.
    pub fn new(addr: IpAddr, len: u8) -> Option<Self> {
        if len > max_len(addr) {
            return None;
        }
        Some(Self {
            addr: mask(addr, len),
            len,
        })
    }

    /// A host prefix (/32 or /128).
    pub fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            len: max_len(addr),
        }
    }

    /// Network address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Prefix length.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Whether this prefix covers exactly one address.
    pub fn is_host(&self) -> bool {
        self.len == max_len(self.addr)
    }

    /// Address family.
    pub fn family(&self) -> AddressFamily {
        match self.addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Whether `other` falls within this network.
    pub fn contains(&self, other: &Prefix) -> bool {
        self.family() == other.family()
            && other.len >= self.len
            && mask(other.addr, self.len) == self.addr
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((addr, len)) => {
                let addr: IpAddr = addr
                    .parse()
                    .map_err(|_| format!("'{addr}' is not an IP address"))?;
                let len: u8 = len
                    .parse()
                    .map_err(|_| format!("'{len}' is not a prefix length"))?;
                Prefix::new(addr, len)
                    .ok_or_else(|| format!("prefix length /{len} is too long for {addr}"))
            }
            None => s
                .parse::<IpAddr>()
                .map(Prefix::host)
                .map_err(|_| format!("'{s}' is not an IP address or prefix")),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{}/{}", self.addr, self.len)
        }
    }
}

fn max_len(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(a) => {
            let bits = u32::from(a);
            let m = if len == 0 { 0 } else { u32::MAX << (32 - u32::from(len)) };
            IpAddr::V4(Ipv4Addr::from(bits & m))
        }
        IpAddr::V6(a) => {
            let bits = u128::from(a);
            let m = if len == 0 { 0 } else { u128::MAX << (128 - u32::from(len)) };
            IpAddr::V6(Ipv6Addr::from(bits & m))
        }
    }
}

/// A validated, canonical query target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// An address or network (route lookups, and ping/traceroute to an IP).
    Prefix(Prefix),

    /// A BGP community (standard, large or well-known name).
    Community(String),

    /// An AS-path regular expression.
    AsPath(String),

    /// A DNS name (ping/traceroute).
    Hostname(String),
}

const WELL_KNOWN_COMMUNITIES: &[&str] = &[
    "no-export",
    "no-advertise",
    "no-export-subconfed",
    "no-peer",
    "blackhole",
    "graceful-shutdown",
    "accept-own",
    "llgr-stale",
    "no-llgr",
];

const MAX_AS_PATH_LEN: usize = 256;

impl Target {
    /// Parse and canonicalize a raw target for a query type.
    pub fn parse(query_type: QueryType, raw: &str) -> Result<Self, QueryError> {
        let invalid = |reason: String| QueryError::InvalidTarget {
            query_type,
            target: raw.to_string(),
            reason,
        };

        let value = raw.trim();
        if value.is_empty() {
            return Err(invalid("target is empty".to_string()));
        }

        match query_type {
            QueryType::BgpRoute => value.parse().map(Target::Prefix).map_err(invalid),
            QueryType::BgpCommunity => parse_community(value).map(Target::Community).map_err(invalid),
            QueryType::BgpAspath => parse_as_path(value).map(Target::AsPath).map_err(invalid),
            QueryType::Ping | QueryType::Traceroute => {
                if let Ok(addr) = value.parse::<IpAddr>() {
                    return Ok(Target::Prefix(Prefix::host(addr)));
                }
                if value.contains('/') {
                    return Err(invalid("expected a host address, not a network".to_string()));
                }
                parse_hostname(value).map(Target::Hostname).map_err(invalid)
            }
        }
    }

    /// The target as a network, if it is one.
    pub fn as_prefix(&self) -> Option<&Prefix> {
        match self {
            Target::Prefix(p) => Some(p),
            _ => None,
        }
    }

    /// Address family for address targets.
    pub fn family(&self) -> Option<AddressFamily> {
        self.as_prefix().map(Prefix::family)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Prefix(p) => write!(f, "{p}"),
            Target::Community(s) | Target::AsPath(s) | Target::Hostname(s) => f.write_str(s),
        }
    }
}

fn parse_community(value: &str) -> Result<String, String> {
    let lower = value.to_ascii_lowercase();
    if WELL_KNOWN_COMMUNITIES.contains(&lower.as_str()) {
        return Ok(lower);
    }

    let parts: Vec<&str> = value.split(':').collect();
    match parts.as_slice() {
        [asn, val] => {
            let asn: u16 = asn
                .parse()
                .map_err(|_| format!("'{asn}' is not a 16-bit community field"))?;
            let val: u16 = val
                .parse()
                .map_err(|_| format!("'{val}' is not a 16-bit community field"))?;
            Ok(format!("{asn}:{val}"))
        }
        [global, local1, local2] => {
            let mut fields = Vec::with_capacity(3);
            for field in [global, local1, local2] {
                let n: u32 = field
                    .parse()
                    .map_err(|_| format!("'{field}' is not a 32-bit large community field"))?;
                fields.push(n.to_string());
            }
            Ok(fields.join(":"))
        }
        _ => Err("expected ASN:value, a large community or a well-known name".to_string()),
    }
}

fn parse_as_path(value: &str) -> Result<String, String> {
    if value.len() > MAX_AS_PATH_LEN {
        return Err(format!("longer than {MAX_AS_PATH_LEN} characters"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_digit() || " _^$.*+?()[]|{},-".contains(*c)))
    {
        return Err(format!("character '{c}' is not allowed in an AS-path expression"));
    }
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    // Junos-style '_' delimiters are not valid in every engine; check the rest.
    Regex::new(&normalized.replace('_', " ")).map_err(|e| e.to_string())?;
    Ok(normalized)
}

fn parse_hostname(value: &str) -> Result<String, String> {
    let name = value.trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() || name.len() > 253 {
        return Err("hostname must be between 1 and 253 characters".to_string());
    }
    for label in name.split('.') {
        let valid = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(format!("'{label}' is not a valid hostname label"));
        }
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_canonicalization() {
        let a: Prefix = "10.0.0.1".parse().unwrap();
        let b: Prefix = "10.0.0.1/32".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "10.0.0.1");

        let masked: Prefix = "10.1.2.3/8".parse().unwrap();
        assert_eq!(masked.to_string(), "10.0.0.0/8");

        let v6: Prefix = "2001:DB8::1".parse().unwrap();
        assert_eq!(v6.to_string(), "2001:db8::1");
        assert!("10.0.0.0/33".parse::<Prefix>().is_err());
        assert!("not-an-ip".parse::<Prefix>().is_err());
    }

    #[test]
    fn test_prefix_contains() {
        let net: Prefix = "10.0.0.0/8".parse().unwrap();
        assert!(net.contains(&"10.1.2.3".parse().unwrap()));
        assert!(net.contains(&"10.128.0.0/9".parse().unwrap()));
        assert!(!net.contains(&"11.0.0.1".parse().unwrap()));
        assert!(!net.contains(&"0.0.0.0/0".parse().unwrap()));
        assert!(!net.contains(&"::ffff:10.0.0.1".parse().unwrap()));

        let default: Prefix = "0.0.0.0/0".parse().unwrap();
        assert!(default.contains(&"8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_route_target() {
        let t = Target::parse(QueryType::BgpRoute, " 192.0.2.0/24 ").unwrap();
        assert_eq!(t.to_string(), "192.0.2.0/24");
        assert_eq!(t.family(), Some(AddressFamily::Ipv4));

        let err = Target::parse(QueryType::BgpRoute, "example.com").unwrap_err();
        assert!(matches!(err, QueryError::InvalidTarget { .. }));
    }

    #[test]
    fn test_community_target() {
        let t = Target::parse(QueryType::BgpCommunity, "65000:0100").unwrap();
        assert_eq!(t, Target::Community("65000:100".to_string()));

        let t = Target::parse(QueryType::BgpCommunity, "NO-EXPORT").unwrap();
        assert_eq!(t, Target::Community("no-export".to_string()));

        let t = Target::parse(QueryType::BgpCommunity, "4200000000:1:2").unwrap();
        assert_eq!(t.to_string(), "4200000000:1:2");

        assert!(Target::parse(QueryType::BgpCommunity, "70000:1").is_err());
        assert!(Target::parse(QueryType::BgpCommunity, "65000:1; reload").is_err());
    }

    #[test]
    fn test_as_path_target() {
        let t = Target::parse(QueryType::BgpAspath, "_15169$").unwrap();
        assert_eq!(t.to_string(), "_15169$");

        let t = Target::parse(QueryType::BgpAspath, "^65000   15169$").unwrap();
        assert_eq!(t.to_string(), "^65000 15169$");

        assert!(Target::parse(QueryType::BgpAspath, "15169\"; show run").is_err());
        assert!(Target::parse(QueryType::BgpAspath, "(15169").is_err());
    }

    #[test]
    fn test_ping_target() {
        let t = Target::parse(QueryType::Ping, "8.8.8.8").unwrap();
        assert_eq!(t, Target::Prefix(Prefix::host("8.8.8.8".parse().unwrap())));

        let t = Target::parse(QueryType::Traceroute, "Dns.Google.").unwrap();
        assert_eq!(t, Target::Hostname("dns.google".to_string()));

        assert!(Target::parse(QueryType::Ping, "10.0.0.0/8").is_err());
        assert!(Target::parse(QueryType::Ping, "-bad.example").is_err());
        assert!(Target::parse(QueryType::Ping, "a b").is_err());
        assert!(Target::parse(QueryType::Ping, "   ").is_err());
    }
}
