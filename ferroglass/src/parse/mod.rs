//! Response parsing: raw CLI text to structured results.
//!
//! Each [`ParserKind`] is a set of line rules for one family of output
//! formats. Parsing is best-effort: lines no rule recognizes are skipped.
//! Every parser reports whether *any* line matched, so an empty route table
//! can be told apart from output nobody understood.
//!
//! Blank output counts as matched: a device that prints nothing for a
//! lookup has answered "no routes".
//!
//! A (platform, query type) pair without a parser degrades to
//! [`StructuredResult::Raw`].

mod bgp_detail;
mod bgp_table;
mod juniper;
mod ping;
mod traceroute;

use crate::model::{QueryType, RouteTable, StructuredResult};

/// Structured extractors known to the platform table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// JunOS `show route ... detail` blocks.
    JuniperRoute,

    /// IOS-style `BGP routing table entry for ...` blocks (IOS, IOS-XR,
    /// EOS, FRR).
    BgpDetail,

    /// IOS-style BGP table with Network / Next Hop / Path columns.
    BgpTable,

    /// Ping summary (Unix, JunOS and Cisco formats).
    Ping,

    /// Traceroute hop list (Unix, JunOS and Cisco formats).
    Traceroute,
}

impl ParserKind {
    /// Parse the outputs of every command issued for one device.
    ///
    /// Route rows from several outputs are concatenated in command order.
    pub fn parse(self, query_type: QueryType, outputs: &[String]) -> StructuredResult {
        match self {
            ParserKind::JuniperRoute => routes(query_type, outputs, juniper::parse),
            ParserKind::BgpDetail => routes(query_type, outputs, bgp_detail::parse),
            ParserKind::BgpTable => routes(query_type, outputs, bgp_table::parse),
            ParserKind::Ping => StructuredResult::Ping {
                stats: ping::parse(&outputs.join("\n")),
            },
            ParserKind::Traceroute => StructuredResult::Traceroute {
                path: traceroute::parse(&outputs.join("\n")),
            },
        }
    }
}

/// Parse outputs with an optional extractor, degrading to raw text.
pub fn parse(parser: Option<ParserKind>, query_type: QueryType, outputs: &[String]) -> StructuredResult {
    match parser {
        Some(kind) => kind.parse(query_type, outputs),
        None => StructuredResult::Raw {
            query_type,
            output: outputs.join("\n"),
        },
    }
}

fn routes(query_type: QueryType, outputs: &[String], parse_one: fn(&str) -> RouteTable) -> StructuredResult {
    let mut table = RouteTable::default();
    for output in outputs {
        let parsed = parse_one(output);
        table.any_line_matched |= parsed.any_line_matched;
        table.routes.extend(parsed.routes);
    }
    if outputs.iter().all(|o| o.trim().is_empty()) {
        table.any_line_matched = true;
    }
    StructuredResult::Routes { query_type, table }
}

/// ASNs in an AS-path string, in order.
///
/// AS sets (`{64500,64501}`) and confederation segments (`(65001 65002)`)
/// are flattened; origin codes and other annotations are dropped.
pub(crate) fn as_path_numbers(text: &str) -> Vec<u32> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_matches(|c| matches!(c, '{' | '}' | '(' | ')' | '[' | ']')))
        .filter_map(|token| token.parse().ok())
        .collect()
}
