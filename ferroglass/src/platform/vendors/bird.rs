//! BIRD platform definition.
//!
//! Route lookups use `birdc -r` (restricted mode). BIRD has no community
//! or AS-path lookup command usable from a looking glass, and its route
//! output has no structured parser: answers are returned as raw text.

use crate::command::{CommandTemplate, TemplateLine};
use crate::model::QueryType;
use crate::parse::ParserKind;
use crate::platform::{PlatformDefinition, PlatformFamily};

use super::linux;

/// Create the BIRD platform definition.
pub fn platform() -> PlatformDefinition {
    linux::shell_platform(PlatformFamily::Bird)
        .with_failure_pattern("syntax error")
        .with_failure_pattern("Unable to connect to server")
        .with_template(
            QueryType::BgpRoute,
            CommandTemplate::new([TemplateLine::any("birdc -r 'show route for {target} all'")])
                .with_named_vrf([TemplateLine::any(
                    "birdc -r 'show route for {target} table {vrf} all'",
                )]),
        )
        .with_template(QueryType::Ping, linux::ping())
        .with_template(QueryType::Traceroute, linux::traceroute())
        .with_parser(QueryType::Ping, ParserKind::Ping)
        .with_parser(QueryType::Traceroute, ParserKind::Traceroute)
}
