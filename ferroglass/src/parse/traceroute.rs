//! Traceroute hop lists.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{TracerouteHop, TraceroutePath};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:traceroute6? to \S+|Tracing the route to \S+)").expect("static regex")
});

static HOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})\s+(.*)$").expect("static regex"));

/// `[AS 15169]`, `[MPLS: Label 24001 Exp 0]` and similar annotations.
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("static regex"));

/// Parse traceroute output.
pub(super) fn parse(output: &str) -> TraceroutePath {
    let mut path = TraceroutePath::default();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');

        if HEADER.is_match(line.trim_start()) {
            path.any_line_matched = true;
            continue;
        }
        let Some(caps) = HOP.captures(line) else {
            continue;
        };
        let Ok(number) = caps[1].parse() else {
            continue;
        };
        if let Some(hop) = parse_hop(number, &caps[2]) {
            path.hops.push(hop);
            path.any_line_matched = true;
        }
    }

    path
}

fn parse_hop(number: u32, rest: &str) -> Option<TracerouteHop> {
    let rest = ANNOTATION.replace_all(rest, " ");
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut hop = TracerouteHop {
        hop: number,
        ..TracerouteHop::default()
    };

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let next = tokens.get(i + 1).copied();

        if token == "*" {
            hop.rtts_ms.push(None);
        } else if let (Ok(rtt), Some("ms" | "msec")) = (token.parse::<f64>(), next) {
            hop.rtts_ms.push(Some(rtt));
            i += 1;
        } else if let Some(address) = next.and_then(parenthesized_address) {
            if hop.address.is_none() {
                hop.host = Some(token.to_string());
                hop.address = Some(address.to_string());
            }
            i += 1;
        } else if token.parse::<IpAddr>().is_ok() {
            hop.address.get_or_insert_with(|| token.to_string());
        } else if token.starts_with('!') {
            // Unreachable markers (!H, !N) follow the RTT they annotate.
        } else {
            return None;
        }
        i += 1;
    }

    if hop.address.is_none() && hop.rtts_ms.is_empty() {
        return None;
    }
    Some(hop)
}

fn parenthesized_address(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('(')?.strip_suffix(')')?;
    inner.parse::<IpAddr>().ok().map(|_| inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_traceroute() {
        let output = "\
traceroute to 8.8.8.8 (8.8.8.8), 30 hops max, 60 byte packets
 1  gw.example.net (192.0.2.254)  0.512 ms
 2  *
 3  dns.google (8.8.8.8)  1.234 ms
";
        let path = parse(output);
        assert!(path.any_line_matched);
        assert_eq!(path.hops.len(), 3);

        assert_eq!(path.hops[0].hop, 1);
        assert_eq!(path.hops[0].host.as_deref(), Some("gw.example.net"));
        assert_eq!(path.hops[0].address.as_deref(), Some("192.0.2.254"));
        assert_eq!(path.hops[0].rtts_ms, vec![Some(0.512)]);

        assert_eq!(path.hops[1].address, None);
        assert_eq!(path.hops[1].rtts_ms, vec![None]);

        assert_eq!(path.hops[2].address.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn test_junos_traceroute() {
        let output = "\
traceroute to 8.8.8.8 (8.8.8.8), 30 hops max, 40 byte packets
 1  203.0.113.1 (203.0.113.1)  0.501 ms  0.412 ms  0.398 ms
 2  * * *
";
        let path = parse(output);
        assert_eq!(path.hops.len(), 2);
        assert_eq!(path.hops[0].rtts_ms, vec![Some(0.501), Some(0.412), Some(0.398)]);
        assert_eq!(path.hops[1].rtts_ms, vec![None, None, None]);
    }

    #[test]
    fn test_cisco_traceroute() {
        let output = "\
Type escape sequence to abort.
Tracing the route to 8.8.8.8
VRF info: (vrf in name/id, vrf out name/id)
  1 203.0.113.1 4 msec 1 msec 1 msec
  2 198.51.100.1 [AS 15169] 2 msec *  3 msec
  3 dns.google (8.8.8.8) [AS 15169] 3 msec 2 msec 2 msec
";
        let path = parse(output);
        assert!(path.any_line_matched);
        assert_eq!(path.hops.len(), 3);
        assert_eq!(path.hops[0].address.as_deref(), Some("203.0.113.1"));
        assert_eq!(path.hops[0].host, None);
        assert_eq!(path.hops[1].rtts_ms, vec![Some(2.0), None, Some(3.0)]);
        assert_eq!(path.hops[2].host.as_deref(), Some("dns.google"));
    }

    #[test]
    fn test_unrecognized() {
        let path = parse("traceroute: unknown host nowhere.invalid\n");
        assert!(!path.any_line_matched);
        assert!(path.hops.is_empty());
    }
}
