//! IOS-style BGP table output.
//!
//! Used for community and AS-path lookups on IOS, IOS-XR, EOS and FRR:
//!
//! ```text
//!      Network          Next Hop            Metric LocPrf Weight Path
//!  *>  8.8.8.0/24       203.0.113.1              0    100      0 15169 i
//!  *                    198.51.100.1                   90      0 3356 15169 i
//! ```
//!
//! Columns are located from the header line. A row without a network
//! repeats the previous prefix; a row too long for its columns wraps onto
//! the next line and is joined before it is emitted.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use super::as_path_numbers;
use crate::model::{RouteEntry, RouteTable};

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:BGP table version is|BGP routing table information for|No BGP prefixes displayed|%?\s*Network not in table)",
    )
    .expect("static regex")
});

/// Route status codes that may precede the network column.
const STATUS_CHARS: &str = "*>sdhrSmbfxacRE=iVINLe#u";

/// Character span of a header column.
type Span = (usize, usize);

#[derive(Debug)]
struct Columns {
    next_hop: usize,
    metric: Option<Span>,
    local_pref: Option<Span>,
    weight: Option<Span>,
    path: usize,
}

impl Columns {
    fn from_header(line: &str) -> Option<Self> {
        let span = |name: &str| line.find(name).map(|start| (start, start + name.len()));
        if !line.contains("Network") {
            return None;
        }
        Some(Self {
            next_hop: line.find("Next Hop")?,
            metric: span("Metric"),
            local_pref: span("LocPrf").or_else(|| span("LocPref")),
            weight: span("Weight"),
            path: line.rfind("Path")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Metric,
    LocalPref,
    Weight,
}

#[derive(Debug, Default)]
struct Row {
    status: String,
    network: Option<String>,
    next_hop: Option<String>,
    metric: Option<u32>,
    local_pref: Option<u32>,
}

impl Row {
    fn is_started(&self) -> bool {
        self.network.is_some() || self.next_hop.is_some()
    }
}

/// Parse one command's output.
pub(super) fn parse(output: &str) -> RouteTable {
    let mut table = RouteTable::default();
    let mut columns: Option<Columns> = None;
    let mut last_prefix: Option<String> = None;
    let mut pending: Option<Row> = None;

    for line in output.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(found) = Columns::from_header(line) {
            columns = Some(found);
            pending = None;
            table.any_line_matched = true;
            continue;
        }
        if PREAMBLE.is_match(line.trim_start()) {
            table.any_line_matched = true;
            continue;
        }
        let Some(cols) = &columns else {
            continue;
        };
        if line.trim().is_empty() {
            pending = None;
            continue;
        }

        let mut row = pending.take().unwrap_or_default();
        let mut path = None;
        let mut recognized = true;

        for (pos, token) in tokens(line) {
            if pos >= cols.path && row.is_started() {
                path = Some(line[pos..].trim());
                break;
            }
            if let Some((status, address)) = split_status(token) {
                row.status.push_str(status);
                if row.network.is_none() && row.next_hop.is_none() && pos < cols.next_hop {
                    row.network = Some(address.to_string());
                } else if row.next_hop.is_none() {
                    row.next_hop = Some(address.to_string());
                }
            } else if !row.is_started() && token.chars().all(|c| STATUS_CHARS.contains(c)) {
                row.status.push_str(token);
            } else if let Ok(value) = token.parse::<u32>() {
                match nearest(cols, (pos, pos + token.len())) {
                    Some(Numeric::Metric) => row.metric = Some(value),
                    Some(Numeric::LocalPref) => row.local_pref = Some(value),
                    Some(Numeric::Weight) | None => {}
                }
            } else {
                recognized = false;
                break;
            }
        }

        if !recognized {
            continue;
        }

        match path {
            Some(path) => {
                if let Some(network) = row.network.take() {
                    last_prefix = Some(network);
                }
                let Some(prefix) = last_prefix.clone() else {
                    continue;
                };
                table.routes.push(RouteEntry {
                    prefix,
                    active: row.status.contains('>'),
                    protocol: Some("BGP".to_string()),
                    next_hop: row.next_hop,
                    as_path: as_path_numbers(path),
                    local_pref: row.local_pref,
                    med: row.metric,
                    ..RouteEntry::default()
                });
                table.any_line_matched = true;
            }
            None if row.is_started() => pending = Some(row),
            None => {}
        }
    }

    table
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

fn is_address(token: &str) -> bool {
    match token.split_once('/') {
        Some((addr, len)) => addr.parse::<IpAddr>().is_ok() && len.parse::<u8>().is_ok(),
        None => token.parse::<IpAddr>().is_ok(),
    }
}

/// Split a token into leading status codes and an address (`*>i10.0.0.0/8`).
fn split_status(token: &str) -> Option<(&str, &str)> {
    for (i, c) in token.char_indices() {
        if is_address(&token[i..]) {
            return Some((&token[..i], &token[i..]));
        }
        if !STATUS_CHARS.contains(c) {
            return None;
        }
    }
    None
}

/// Numeric column closest to a token span.
fn nearest(cols: &Columns, (start, end): Span) -> Option<Numeric> {
    let distance = |(cs, ce): Span| {
        if end <= cs {
            cs - end
        } else if start >= ce {
            start - ce
        } else {
            0
        }
    };
    [
        (Numeric::Metric, cols.metric),
        (Numeric::LocalPref, cols.local_pref),
        (Numeric::Weight, cols.weight),
    ]
    .into_iter()
    .filter_map(|(kind, span)| span.map(|s| (distance(s), kind)))
    .min_by_key(|(d, _)| *d)
    .map(|(_, kind)| kind)
}
