//! Cisco IOS-XR platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! RP/0/RSP0/CPU0:router#
//! RP/0/RP0/CPU0:pe1.lab#
//! router#
//! ```

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily};

/// Exec prompt, optionally prefixed with the route-processor location.
pub const PROMPT_PATTERN: &str = r"(?mi)^(RP/\d+/(RS?P)?\d+/CPU\d+:)?[\w.\-@/:]{1,63}[>#]\s?$";

/// Create the Cisco IOS-XR platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PlatformFamily::CiscoXr, PROMPT_PATTERN)
        .expect("static prompt pattern")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Bad")
        .with_failure_pattern("% Error")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 512")
        .with_terminal_size(512, 24)
        .with_template(
            QueryType::BgpRoute,
            CommandTemplate::new([
                TemplateLine::ipv4("show bgp ipv4 unicast {target}"),
                TemplateLine::ipv6("show bgp ipv6 unicast {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show bgp vrf {vrf} ipv4 unicast {target}"),
                TemplateLine::ipv6("show bgp vrf {vrf} ipv6 unicast {target}"),
            ]),
        )
        .with_template(
            QueryType::BgpCommunity,
            CommandTemplate::new([
                TemplateLine::ipv4("show bgp ipv4 unicast community {target}"),
                TemplateLine::ipv6("show bgp ipv6 unicast community {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show bgp vrf {vrf} ipv4 unicast community {target}"),
                TemplateLine::ipv6("show bgp vrf {vrf} ipv6 unicast community {target}"),
            ]),
        )
        .with_template(
            QueryType::BgpAspath,
            CommandTemplate::new([
                TemplateLine::ipv4("show bgp ipv4 unicast regexp {target}"),
                TemplateLine::ipv6("show bgp ipv6 unicast regexp {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show bgp vrf {vrf} ipv4 unicast regexp {target}"),
                TemplateLine::ipv6("show bgp vrf {vrf} ipv6 unicast regexp {target}"),
            ]),
        )
        .with_template(
            QueryType::Ping,
            CommandTemplate::new([
                TemplateLine::ipv4("ping ipv4 {target} count 5 source {source}")
                    .or_without_source("ping ipv4 {target} count 5"),
                TemplateLine::ipv6("ping ipv6 {target} count 5 source {source}")
                    .or_without_source("ping ipv6 {target} count 5"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("ping vrf {vrf} ipv4 {target} count 5 source {source}")
                    .or_without_source("ping vrf {vrf} ipv4 {target} count 5"),
                TemplateLine::ipv6("ping vrf {vrf} ipv6 {target} count 5 source {source}")
                    .or_without_source("ping vrf {vrf} ipv6 {target} count 5"),
            ]),
        )
        .with_template(
            QueryType::Traceroute,
            CommandTemplate::new([
                TemplateLine::ipv4("traceroute ipv4 {target} timeout 1 probe 2 source {source}")
                    .or_without_source("traceroute ipv4 {target} timeout 1 probe 2"),
                TemplateLine::ipv6("traceroute ipv6 {target} timeout 1 probe 2 source {source}")
                    .or_without_source("traceroute ipv6 {target} timeout 1 probe 2"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4(
                    "traceroute vrf {vrf} ipv4 {target} timeout 1 probe 2 source {source}",
                )
                .or_without_source("traceroute vrf {vrf} ipv4 {target} timeout 1 probe 2"),
                TemplateLine::ipv6(
                    "traceroute vrf {vrf} ipv6 {target} timeout 1 probe 2 source {source}",
                )
                .or_without_source("traceroute vrf {vrf} ipv6 {target} timeout 1 probe 2"),
            ]),
        )
        .with_parser(QueryType::BgpRoute, ParserKind::BgpDetail)
        .with_parser(QueryType::BgpCommunity, ParserKind::BgpTable)
        .with_parser(QueryType::BgpAspath, ParserKind::BgpTable)
        .with_parser(QueryType::Ping, ParserKind::Ping)
        .with_parser(QueryType::Traceroute, ParserKind::Traceroute)
}
