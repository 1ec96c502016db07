//! IOS-style BGP detail output.
//!
//! Shared by IOS, IOS-XR, EOS and FRR:
//!
//! ```text
//! BGP routing table entry for 8.8.8.0/24, version 123456
//! Paths: (2 available, best #1, table default)
//!   15169
//!     203.0.113.1 from 203.0.113.1 (8.8.8.8)
//!       Origin IGP, metric 0, localpref 100, valid, external, best
//!       Community: 65000:100 65000:200
//! ```
//!
//! Each path starts at its `<next hop> from <peer> (<router id>)` line; the
//! AS path is the line right above it.

use std::sync::LazyLock;

use regex::Regex;

use super::as_path_numbers;
use crate::model::{RouteEntry, RouteTable};

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BGP routing table entry for ([^\s,]+)").expect("static regex")
});

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:BGP routing table information for|%?\s*Network not in table|Paths: )")
        .expect("static regex")
});

static AS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s+((?:\d+|\{[\d,]+\}|\([\d ]+\))(?:\s+(?:\d+|\{[\d,]+\}|\([\d ]+\)))*|Local)(?:,.*)?\s*$",
    )
    .expect("static regex")
});

static NEXT_HOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\S+)(?:\s+\(metric \d+\))?(?:\s+\(inaccessible\))? from (\S+) \(([^)]+)\)")
        .expect("static regex")
});

static ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Origin \w+").expect("static regex"));

static LOCAL_PREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"localpref (\d+)").expect("static regex"));

static METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r", metric (\d+)").expect("static regex"));

static RECEIVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"received (\S+) ago").expect("static regex"));

static COMMUNITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?:Large )?Community: (.+?)\s*$").expect("static regex")
});

static LAST_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Last update: (.+?)\s*$").expect("static regex"));

/// Parse one command's output.
pub(super) fn parse(output: &str) -> RouteTable {
    let mut table = RouteTable::default();
    let mut prefix = String::new();
    let mut pending_path: Option<Vec<u32>> = None;

    for line in output.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(caps) = ENTRY.captures(line) {
            prefix = caps[1].to_string();
            pending_path = None;
            table.any_line_matched = true;
            continue;
        }

        if HEADER.is_match(line.trim_start()) {
            table.any_line_matched = true;
            continue;
        }

        if let Some(caps) = NEXT_HOP.captures(line) {
            table.routes.push(RouteEntry {
                prefix: prefix.clone(),
                protocol: Some("BGP".to_string()),
                next_hop: Some(caps[1].to_string()),
                peer: Some(caps[2].to_string()),
                as_path: pending_path.take().unwrap_or_default(),
                ..RouteEntry::default()
            });
            table.any_line_matched = true;
            continue;
        }

        if let Some(caps) = AS_PATH.captures(line) {
            pending_path = Some(as_path_numbers(&caps[1]));
            continue;
        }

        // Everything below describes the path started last.
        let Some(route) = table.routes.last_mut() else {
            continue;
        };

        if ORIGIN.is_match(line) {
            route.local_pref = LOCAL_PREF
                .captures(line)
                .and_then(|c| c[1].parse().ok());
            route.med = METRIC.captures(line).and_then(|c| c[1].parse().ok());
            route.active = line.split(',').any(|attr| {
                let attr = attr.trim();
                attr == "best" || attr.starts_with("best ")
            });
            if let Some(caps) = RECEIVED.captures(line) {
                route.age = Some(caps[1].to_string());
            }
            table.any_line_matched = true;
        } else if let Some(caps) = COMMUNITY.captures(line) {
            route
                .communities
                .extend(caps[1].split_whitespace().map(str::to_string));
            table.any_line_matched = true;
        } else if let Some(caps) = LAST_UPDATE.captures(line) {
            route.age = Some(caps[1].to_string());
            table.any_line_matched = true;
        }
    }

    table
}
