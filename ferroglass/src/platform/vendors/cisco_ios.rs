//! Cisco IOS / IOS-XE platform definition.

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily};

/// Exec or privileged-exec prompt (`router>`, `router#`).
pub const PROMPT_PATTERN: &str = r"(?mi)^[\w.\-@/:]{1,63}[>#]\s?$";

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PlatformFamily::CiscoIos, PROMPT_PATTERN)
        .expect("static prompt pattern")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Unknown command")
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
                TemplateLine::ipv4("show bgp vpnv4 unicast vrf {vrf} {target}"),
                TemplateLine::ipv6("show bgp vpnv6 unicast vrf {vrf} {target}"),
            ]),
        )
        .with_template(
            QueryType::BgpCommunity,
            CommandTemplate::new([
                TemplateLine::ipv4("show bgp ipv4 unicast community {target}"),
                TemplateLine::ipv6("show bgp ipv6 unicast community {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show bgp vpnv4 unicast vrf {vrf} community {target}"),
                TemplateLine::ipv6("show bgp vpnv6 unicast vrf {vrf} community {target}"),
            ]),
        )
        .with_template(
            QueryType::BgpAspath,
            CommandTemplate::new([
                TemplateLine::ipv4(r#"show bgp ipv4 unicast quote-regexp "{target}""#),
                TemplateLine::ipv6(r#"show bgp ipv6 unicast quote-regexp "{target}""#),
            ])
            .with_named_vrf([
                TemplateLine::ipv4(r#"show bgp vpnv4 unicast vrf {vrf} quote-regexp "{target}""#),
                TemplateLine::ipv6(r#"show bgp vpnv6 unicast vrf {vrf} quote-regexp "{target}""#),
            ]),
        )
        .with_template(
            QueryType::Ping,
            CommandTemplate::new([TemplateLine::any("ping {target} repeat 5 source {source}")
                .or_without_source("ping {target} repeat 5")])
            .with_named_vrf([TemplateLine::any("ping vrf {vrf} {target} repeat 5 source {source}")
                .or_without_source("ping vrf {vrf} {target} repeat 5")]),
        )
        .with_template(
            QueryType::Traceroute,
            CommandTemplate::new([
                TemplateLine::any("traceroute {target} timeout 1 probe 2 source {source}")
                    .or_without_source("traceroute {target} timeout 1 probe 2"),
            ])
            .with_named_vrf([
                TemplateLine::any("traceroute vrf {vrf} {target} timeout 1 probe 2 source {source}")
                    .or_without_source("traceroute vrf {vrf} {target} timeout 1 probe 2"),
            ]),
        )
        .with_parser(QueryType::BgpRoute, ParserKind::BgpDetail)
        .with_parser(QueryType::BgpCommunity, ParserKind::BgpTable)
        .with_parser(QueryType::BgpAspath, ParserKind::BgpTable)
        .with_parser(QueryType::Ping, ParserKind::Ping)
        .with_parser(QueryType::Traceroute, ParserKind::Traceroute)
}
