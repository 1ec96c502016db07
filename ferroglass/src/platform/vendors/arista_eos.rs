//! Arista EOS platform definition.
//!
//! Queries run from privileged EXEC (`#`), though the unprivileged `>`
//! prompt is accepted as well: every lookup is a `show`, `ping` or
//! `traceroute`.
//!
//! # Prompt Examples
//!
//! ```text
//! switch>                            # exec mode
//! switch#                            # privilege_exec mode
//! ```

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily};

/// Exec or privileged-exec prompt.
pub const PROMPT_PATTERN: &str = r"(?mi)^[\w.\-@()/: ]{1,63}[>#]\s?$";

/// Create the Arista EOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PlatformFamily::AristaEos, PROMPT_PATTERN)
        .expect("static prompt pattern")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Error")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unavailable command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 32767")
        .with_terminal_size(32767, 24)
        .with_template(
            QueryType::BgpRoute,
            CommandTemplate::new([
                TemplateLine::ipv4("show ip bgp {target}"),
                TemplateLine::ipv6("show ipv6 bgp {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show ip bgp {target} vrf {vrf}"),
                TemplateLine::ipv6("show ipv6 bgp {target} vrf {vrf}"),
            ]),
        )
        .with_template(
            QueryType::BgpCommunity,
            CommandTemplate::new([
                TemplateLine::ipv4("show ip bgp community {target}"),
                TemplateLine::ipv6("show ipv6 bgp community {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show ip bgp community {target} vrf {vrf}"),
                TemplateLine::ipv6("show ipv6 bgp community {target} vrf {vrf}"),
            ]),
        )
        .with_template(
            QueryType::BgpAspath,
            CommandTemplate::new([
                TemplateLine::ipv4("show ip bgp regexp {target}"),
                TemplateLine::ipv6("show ipv6 bgp regexp {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("show ip bgp regexp {target} vrf {vrf}"),
                TemplateLine::ipv6("show ipv6 bgp regexp {target} vrf {vrf}"),
            ]),
        )
        .with_template(
            QueryType::Ping,
            CommandTemplate::new([
                TemplateLine::ipv4("ping ip {target} repeat 5 source {source}")
                    .or_without_source("ping ip {target} repeat 5"),
                TemplateLine::ipv6("ping ipv6 {target} repeat 5 source {source}")
                    .or_without_source("ping ipv6 {target} repeat 5"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("ping vrf {vrf} ip {target} repeat 5 source {source}")
                    .or_without_source("ping vrf {vrf} ip {target} repeat 5"),
                TemplateLine::ipv6("ping vrf {vrf} ipv6 {target} repeat 5 source {source}")
                    .or_without_source("ping vrf {vrf} ipv6 {target} repeat 5"),
            ]),
        )
        .with_template(
            QueryType::Traceroute,
            CommandTemplate::new([
                TemplateLine::ipv4("traceroute {target} source {source}")
                    .or_without_source("traceroute {target}"),
                TemplateLine::ipv6("traceroute ipv6 {target} source {source}")
                    .or_without_source("traceroute ipv6 {target}"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("traceroute vrf {vrf} {target} source {source}")
                    .or_without_source("traceroute vrf {vrf} {target}"),
                TemplateLine::ipv6("traceroute vrf {vrf} ipv6 {target} source {source}")
                    .or_without_source("traceroute vrf {vrf} ipv6 {target}"),
            ]),
        )
        .with_parser(QueryType::BgpRoute, ParserKind::BgpDetail)
        .with_parser(QueryType::BgpCommunity, ParserKind::BgpTable)
        .with_parser(QueryType::BgpAspath, ParserKind::BgpTable)
        .with_parser(QueryType::Ping, ParserKind::Ping)
        .with_parser(QueryType::Traceroute, ParserKind::Traceroute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Target, Vrf};

    #[test]
    fn test_prompt_match() {
        let platform = platform();
        let prompt = &platform.prompt_pattern;

        assert!(prompt.is_match(b"switch>"));
        assert!(prompt.is_match(b"switch# "));
        assert!(prompt.is_match(b"lg@edge1.fra#"));
        assert!(!prompt.is_match(b"BGP routing table information for VRF default"));
    }

    #[test]
    fn test_named_vrf_route() {
        let platform = platform();
        let tpl = &platform.templates[&QueryType::BgpRoute];
        let target = Target::parse(QueryType::BgpRoute, "198.51.100.0/24").unwrap();
        assert_eq!(
            tpl.render(&target, &Vrf::new("blue"), None),
            vec!["show ip bgp 198.51.100.0/24 vrf blue"]
        );
    }

    #[test]
    fn test_failed_when_contains() {
        let platform = platform();
        assert_eq!(
            platform.detect_failure("% Invalid input (at token 3: 'x')"),
            Some("% Invalid input")
        );
    }
}
