//! FRRouting platform definition.
//!
//! BGP lookups go through `vtysh -c`; the command is single-quoted so the
//! shell passes AS-path expressions through untouched.

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily};

use super::linux;

/// Create the FRR platform definition.
pub fn platform() -> PlatformDefinition {
    linux::shell_platform(PlatformFamily::Frr)
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Command incomplete")
        .with_failure_pattern("% Ambiguous command")
        .with_template(
            QueryType::BgpRoute,
            CommandTemplate::new([
                TemplateLine::ipv4("vtysh -c 'show bgp ipv4 unicast {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp ipv6 unicast {target}'"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("vtysh -c 'show bgp vrf {vrf} ipv4 unicast {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp vrf {vrf} ipv6 unicast {target}'"),
            ]),
        )
        .with_template(
            QueryType::BgpCommunity,
            CommandTemplate::new([
                TemplateLine::ipv4("vtysh -c 'show bgp ipv4 unicast community {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp ipv6 unicast community {target}'"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("vtysh -c 'show bgp vrf {vrf} ipv4 unicast community {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp vrf {vrf} ipv6 unicast community {target}'"),
            ]),
        )
        .with_template(
            QueryType::BgpAspath,
            CommandTemplate::new([
                TemplateLine::ipv4("vtysh -c 'show bgp ipv4 unicast regexp {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp ipv6 unicast regexp {target}'"),
            ])
            .with_named_vrf([
                TemplateLine::ipv4("vtysh -c 'show bgp vrf {vrf} ipv4 unicast regexp {target}'"),
                TemplateLine::ipv6("vtysh -c 'show bgp vrf {vrf} ipv6 unicast regexp {target}'"),
            ]),
        )
        .with_template(QueryType::Ping, linux::ping())
        .with_template(QueryType::Traceroute, linux::traceroute())
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
    fn test_vtysh_quoting() {
        let platform = platform();
        let tpl = &platform.templates[&QueryType::BgpAspath];
        let target = Target::parse(QueryType::BgpAspath, "^65000_").unwrap();
        assert_eq!(
            tpl.render(&target, &Vrf::new("default"), None)[0],
            "vtysh -c 'show bgp ipv4 unicast regexp ^65000_'"
        );
    }

    #[test]
    fn test_frr_failure_patterns_extend_shell() {
        let platform = platform();
        assert!(platform.detect_failure("% Unknown command: show bgp foo").is_some());
        assert!(platform.detect_failure("sh: 1: vtysh: command not found").is_some());
    }
}
