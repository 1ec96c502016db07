//! Juniper JUNOS platform definition.
//!
//! Queries run in operational mode. Prompt patterns are adapted from
//! [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! user@router>              # operational mode
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # prompt on next line
//! ```
//!
//! # Routing tables
//!
//! The default VRF lives in `inet.0` / `inet6.0`; a routing instance `X`
//! lives in `X.inet.0` / `X.inet6.0`. Community and AS-path lookups query
//! both families and the answers are merged.

use std::sync::Arc;

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily, VendorBehavior};

/// Operational mode prompt.
pub const PROMPT_PATTERN: &str = r"(?mi)^(\{\w+(:(\w+)?\d)?\}\n)?[\w\-@()/:\.]{1,63}>\s?$";

/// Create the Juniper JUNOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PlatformFamily::Juniper, PROMPT_PATTERN)
        .expect("static prompt pattern")
        .with_failure_pattern("unknown command")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("error:")
        .with_failure_pattern("missing argument")
        .with_failure_pattern("is ambiguous")
        .with_failure_pattern("invalid numeric value")
        .with_failure_pattern("invalid value")
        .with_on_open_command("set cli screen-length 0")
        .with_on_open_command("set cli screen-width 511")
        .with_terminal_size(511, 24)
        .with_template(QueryType::BgpRoute, bgp_route())
        .with_template(QueryType::BgpCommunity, bgp_community())
        .with_template(QueryType::BgpAspath, bgp_aspath())
        .with_template(QueryType::Ping, ping())
        .with_template(QueryType::Traceroute, traceroute())
        .with_parser(QueryType::BgpRoute, ParserKind::JuniperRoute)
        .with_parser(QueryType::BgpCommunity, ParserKind::JuniperRoute)
        .with_parser(QueryType::BgpAspath, ParserKind::JuniperRoute)
        .with_parser(QueryType::Ping, ParserKind::Ping)
        .with_parser(QueryType::Traceroute, ParserKind::Traceroute)
        .with_behavior(Arc::new(JuniperBehavior))
}

fn bgp_route() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("show route table inet.0 {target} protocol bgp detail"),
        TemplateLine::ipv6("show route table inet6.0 {target} protocol bgp detail"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("show route table {vrf}.inet.0 {target} protocol bgp detail"),
        TemplateLine::ipv6("show route table {vrf}.inet6.0 {target} protocol bgp detail"),
    ])
}

fn bgp_community() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("show route table inet.0 community {target} detail"),
        TemplateLine::ipv6("show route table inet6.0 community {target} detail"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("show route table {vrf}.inet.0 community {target} detail"),
        TemplateLine::ipv6("show route table {vrf}.inet6.0 community {target} detail"),
    ])
}

fn bgp_aspath() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4(r#"show route table inet.0 aspath-regex "{target}" detail"#),
        TemplateLine::ipv6(r#"show route table inet6.0 aspath-regex "{target}" detail"#),
    ])
    .with_named_vrf([
        TemplateLine::ipv4(r#"show route table {vrf}.inet.0 aspath-regex "{target}" detail"#),
        TemplateLine::ipv6(r#"show route table {vrf}.inet6.0 aspath-regex "{target}" detail"#),
    ])
}

fn ping() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("ping inet {target} count 5 rapid source {source}")
            .or_without_source("ping inet {target} count 5 rapid"),
        TemplateLine::ipv6("ping inet6 {target} count 5 rapid source {source}")
            .or_without_source("ping inet6 {target} count 5 rapid"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("ping inet {target} count 5 rapid routing-instance {vrf} source {source}")
            .or_without_source("ping inet {target} count 5 rapid routing-instance {vrf}"),
        TemplateLine::ipv6("ping inet6 {target} count 5 rapid routing-instance {vrf} source {source}")
            .or_without_source("ping inet6 {target} count 5 rapid routing-instance {vrf}"),
    ])
}

fn traceroute() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("traceroute inet {target} wait 1 source {source}")
            .or_without_source("traceroute inet {target} wait 1"),
        TemplateLine::ipv6("traceroute inet6 {target} wait 1 source {source}")
            .or_without_source("traceroute inet6 {target} wait 1"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("traceroute inet {target} wait 1 routing-instance {vrf} source {source}")
            .or_without_source("traceroute inet {target} wait 1 routing-instance {vrf}"),
        TemplateLine::ipv6("traceroute inet6 {target} wait 1 routing-instance {vrf} source {source}")
            .or_without_source("traceroute inet6 {target} wait 1 routing-instance {vrf}"),
    ])
}

/// Juniper JUNOS-specific behavior.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn post_process_output(&self, output: &str) -> String {
        // Routing-engine banners ({master:0}) are not part of the answer.
        output
            .lines()
            .filter(|line| {
                let line = line.trim();
                !(line.starts_with('{') && line.ends_with('}'))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
