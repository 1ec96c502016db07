//! Shared pieces for routing daemons driven from a Linux shell.
//!
//! FRR and BIRD hosts are reached over a plain login shell with `$` (user)
//! or `#` (root) prompts. The daemon CLI is invoked per command and
//! ping/traceroute are the host's own tools, run inside the VRF device
//! with `ip vrf exec` for named VRFs.

use crate::command::{CommandTemplate, TemplateLine};
use crate::platform::{PlatformDefinition, PlatformFamily};

/// User or root shell prompt, alone on its line.
pub const PROMPT_PATTERN: &str = r"(?m)^\S*[$#]\s*$";

/// Base definition for a Linux-hosted routing daemon.
pub fn shell_platform(family: PlatformFamily) -> PlatformDefinition {
    PlatformDefinition::new(family, PROMPT_PATTERN)
        .expect("static prompt pattern")
        .with_failure_pattern("command not found")
        .with_failure_pattern("No such file or directory")
        .with_failure_pattern("Permission denied")
        .with_failure_pattern("Operation not permitted")
        .with_terminal_size(511, 24)
}

/// `ping` from the host.
pub fn ping() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("ping -4 -c 5 -w 5 -I {source} {target}")
            .or_without_source("ping -4 -c 5 -w 5 {target}"),
        TemplateLine::ipv6("ping -6 -c 5 -w 5 -I {source} {target}")
            .or_without_source("ping -6 -c 5 -w 5 {target}"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("ip vrf exec {vrf} ping -4 -c 5 -w 5 -I {source} {target}")
            .or_without_source("ip vrf exec {vrf} ping -4 -c 5 -w 5 {target}"),
        TemplateLine::ipv6("ip vrf exec {vrf} ping -6 -c 5 -w 5 -I {source} {target}")
            .or_without_source("ip vrf exec {vrf} ping -6 -c 5 -w 5 {target}"),
    ])
}

/// `traceroute` from the host.
pub fn traceroute() -> CommandTemplate {
    CommandTemplate::new([
        TemplateLine::ipv4("traceroute -4 -w 1 -q 1 -s {source} {target}")
            .or_without_source("traceroute -4 -w 1 -q 1 {target}"),
        TemplateLine::ipv6("traceroute -6 -w 1 -q 1 -s {source} {target}")
            .or_without_source("traceroute -6 -w 1 -q 1 {target}"),
    ])
    .with_named_vrf([
        TemplateLine::ipv4("ip vrf exec {vrf} traceroute -4 -w 1 -q 1 -s {source} {target}")
            .or_without_source("ip vrf exec {vrf} traceroute -4 -w 1 -q 1 {target}"),
        TemplateLine::ipv6("ip vrf exec {vrf} traceroute -6 -w 1 -q 1 -s {source} {target}")
            .or_without_source("ip vrf exec {vrf} traceroute -6 -w 1 -q 1 {target}"),
    ])
}
