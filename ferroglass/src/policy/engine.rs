//! Policy evaluation.

use std::fmt;

use log::debug;

use super::rule::{Action, Rule};
use crate::error::QueryError;
use crate::model::{Device, QueryType, Target, Vrf};

/// Why a query was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The requested VRF is not configured.
    NoMatchingVrf { vrf: String },

    /// The device does not serve the VRF.
    DeviceNotInVrf { device: String, vrf: String },

    /// The VRF does not enable the query type.
    QueryTypeDisabled { query_type: QueryType, vrf: String },

    /// A deny rule matched first.
    ExplicitDeny { vrf: String, rule: String },

    /// No rule matched and the VRF defaults to deny.
    DefaultDeny { vrf: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoMatchingVrf { vrf } => write!(f, "no matching VRF '{vrf}'"),
            DenyReason::DeviceNotInVrf { device, vrf } => {
                write!(f, "device '{device}' does not serve VRF '{vrf}'")
            }
            DenyReason::QueryTypeDisabled { query_type, vrf } => {
                write!(f, "query type {query_type} is disabled for VRF '{vrf}'")
            }
            DenyReason::ExplicitDeny { vrf, rule } => {
                write!(f, "target explicitly denied by rule '{rule}' in VRF '{vrf}'")
            }
            DenyReason::DefaultDeny { vrf } => {
                write!(f, "target is not permitted in VRF '{vrf}'")
            }
        }
    }
}

/// Result of evaluating a request against policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_permit(&self) -> bool {
        matches!(self, Decision::Permit)
    }

    /// Convert into a query-level result.
    pub fn into_result(self) -> Result<(), QueryError> {
        match self {
            Decision::Permit => Ok(()),
            Decision::Deny(reason) => Err(QueryError::PolicyDenied {
                reason: reason.to_string(),
            }),
        }
    }
}

/// First rule, in declaration order, that is in scope and matches.
///
/// Later rules are never consulted once one matches, even if they are more
/// specific.
pub fn first_match<'a>(
    rules: &'a [Rule],
    query_type: QueryType,
    target: &Target,
) -> Option<(usize, &'a Rule)> {
    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.applies_to(query_type) && rule.matches(target))
}

/// Decide whether `device` may run `query_type` against `target` in `vrf`.
///
/// `target` must already be valid syntax for `query_type`; pass `None` for
/// `vrf` when the requested VRF does not exist. Pure: no side effects.
pub fn evaluate(
    vrf: Option<&Vrf>,
    vrf_name: &str,
    device: &Device,
    query_type: QueryType,
    target: &Target,
) -> Decision {
    let Some(vrf) = vrf else {
        return Decision::Deny(DenyReason::NoMatchingVrf {
            vrf: vrf_name.to_string(),
        });
    };

    if !device.serves(&vrf.name) {
        return Decision::Deny(DenyReason::DeviceNotInVrf {
            device: device.name.clone(),
            vrf: vrf.name.clone(),
        });
    }

    if !vrf.enables(query_type) {
        return Decision::Deny(DenyReason::QueryTypeDisabled {
            query_type,
            vrf: vrf.name.clone(),
        });
    }

    let action = match first_match(&vrf.rules, query_type, target) {
        Some((index, rule)) => {
            debug!(
                "VRF '{}' rule #{} '{}' matched {} {}",
                vrf.name, index, rule, query_type, target
            );
            if rule.action == Action::Deny {
                return Decision::Deny(DenyReason::ExplicitDeny {
                    vrf: vrf.name.clone(),
                    rule: rule.to_string(),
                });
            }
            rule.action
        }
        None => vrf.default_action,
    };

    match action {
        Action::Permit => Decision::Permit,
        Action::Deny => Decision::Deny(DenyReason::DefaultDeny {
            vrf: vrf.name.clone(),
        }),
    }
}
