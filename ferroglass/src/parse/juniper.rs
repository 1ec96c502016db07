//! JunOS `show route ... detail` output.

use std::sync::LazyLock;

use regex::Regex;

use super::as_path_numbers;
use crate::model::{RouteEntry, RouteTable};

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+: \d+ destinations").expect("static regex"));

static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+/\d+) \(\d+ entr").expect("static regex"));

static PATH_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\*?)\s*(\w+)\s+Preference: ").expect("static regex")
});

static SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Source: (\S+)").expect("static regex"));

static NEXT_HOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+Next hop: ([0-9A-Fa-f][0-9A-Fa-f.:]*)").expect("static regex")
});

static PROTOCOL_NEXT_HOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Protocol next hop: (\S+)").expect("static regex"));

static AGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Age: (.+?)(?:\s{2,}|\s*$)").expect("static regex"));

static METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bMetric: (\d+)").expect("static regex"));

static AS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+AS path: (.*)$").expect("static regex"));

static COMMUNITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Communities: (.+?)\s*$").expect("static regex"));

static LOCAL_PREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Localpref: (\d+)").expect("static regex"));

/// Parse one command's output.
pub(super) fn parse(output: &str) -> RouteTable {
    let mut table = RouteTable::default();
    let mut prefix = String::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');

        if TABLE.is_match(line) {
            table.any_line_matched = true;
            continue;
        }
        if let Some(caps) = PREFIX.captures(line) {
            prefix = caps[1].to_string();
            table.any_line_matched = true;
            continue;
        }
        if let Some(caps) = PATH_START.captures(line) {
            table.routes.push(RouteEntry {
                prefix: prefix.clone(),
                active: &caps[1] == "*",
                protocol: Some(caps[2].to_string()),
                ..RouteEntry::default()
            });
            table.any_line_matched = true;
            continue;
        }

        let Some(route) = table.routes.last_mut() else {
            continue;
        };

        if let Some(caps) = SOURCE.captures(line) {
            route.peer = Some(caps[1].to_string());
        } else if let Some(caps) = PROTOCOL_NEXT_HOP.captures(line) {
            // The BGP next hop wins over the resolved forwarding next hop.
            route.next_hop = Some(caps[1].to_string());
        } else if let Some(caps) = NEXT_HOP.captures(line) {
            route.next_hop.get_or_insert_with(|| caps[1].to_string());
        } else if let Some(caps) = AGE.captures(line) {
            route.age = Some(caps[1].to_string());
            route.med = METRIC.captures(line).and_then(|c| c[1].parse().ok());
        } else if let Some(caps) = AS_PATH.captures(line) {
            route.as_path = as_path_numbers(&caps[1]);
        } else if let Some(caps) = COMMUNITIES.captures(line) {
            route.communities.extend(
                caps[1]
                    .split_whitespace()
                    .map(|c| c.strip_prefix("large:").unwrap_or(c).to_string()),
            );
        } else if let Some(caps) = LOCAL_PREF.captures(line) {
            route.local_pref = caps[1].parse().ok();
        } else {
            continue;
        }
        table.any_line_matched = true;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = "
inet.0: 812345 destinations, 1623456 routes (812000 active, 0 holddown, 345 hidden)
8.8.8.0/24 (2 entries, 1 announced)
        *BGP    Preference: 170/-101
                Next hop type: Router, Next hop index: 0
                Next-hop reference count: 2
                Source: 203.0.113.1
                Next hop: 203.0.113.1 via xe-0/0/0.0, selected
                State: <Active Ext>
                Local AS: 65000 Peer AS: 15169
                Age: 2d 3:04:05
                Validation State: valid
                AS path: 15169 I
                Communities: 65000:100 65000:200
                Accepted
                Localpref: 100
                Router ID: 8.8.8.8
         BGP    Preference: 170/-91
                Source: 198.51.100.1
                Next hop: 10.0.0.1 via ae0.0, selected
                Protocol next hop: 198.51.100.1
                Age: 1w0d 2:00:00   Metric: 10      Metric2: 0
                AS path: 3356 15169 I
                Communities: 3356:3 large:3356:0:1
                Localpref: 90
";

    #[test]
    fn test_detail_two_paths() {
        let table = parse(DETAIL);
        assert!(table.any_line_matched);
        assert_eq!(table.routes.len(), 2);

        let active = &table.routes[0];
        assert_eq!(active.prefix, "8.8.8.0/24");
        assert!(active.active);
        assert_eq!(active.protocol.as_deref(), Some("BGP"));
        assert_eq!(active.peer.as_deref(), Some("203.0.113.1"));
        assert_eq!(active.next_hop.as_deref(), Some("203.0.113.1"));
        assert_eq!(active.age.as_deref(), Some("2d 3:04:05"));
        assert_eq!(active.as_path, vec![15169]);
        assert_eq!(active.communities, vec!["65000:100", "65000:200"]);
        assert_eq!(active.local_pref, Some(100));
        assert_eq!(active.med, None);

        let other = &table.routes[1];
        assert!(!other.active);
        assert_eq!(other.next_hop.as_deref(), Some("198.51.100.1"));
        assert_eq!(other.age.as_deref(), Some("1w0d 2:00:00"));
        assert_eq!(other.med, Some(10));
        assert_eq!(other.as_path, vec![3356, 15169]);
        assert_eq!(other.communities, vec!["3356:3", "3356:0:1"]);
    }

    #[test]
    fn test_table_without_routes() {
        let table = parse("inet.0: 12 destinations, 12 routes (12 active, 0 holddown, 0 hidden)\n");
        assert!(table.routes.is_empty());
        assert!(table.any_line_matched);
    }

    #[test]
    fn test_unrecognized() {
        let table = parse("error: could not connect to rpd\n");
        assert!(!table.any_line_matched);
    }
}
