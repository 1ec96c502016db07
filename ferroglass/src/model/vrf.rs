//! VRFs and their access-control policy.

use serde::Serialize;

use super::QueryType;
use crate::policy::{Action, Rule};

/// A routing table queries can be scoped to.
#[derive(Debug, Clone)]
pub struct Vrf {
    /// Unique name, used in requests and command templates.
    pub name: String,

    /// Name shown to users.
    pub display_name: String,

    /// Query types enabled for this VRF.
    pub query_types: Vec<QueryType>,

    /// Access-control rules, evaluated in order; first match wins.
    pub rules: Vec<Rule>,

    /// Action when no rule matches.
    pub default_action: Action,
}

impl Vrf {
    /// Name of the global routing table.
    pub const DEFAULT_NAME: &'static str = "default";

    /// Create a VRF with every query type enabled, no rules and a permit default.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            query_types: QueryType::ALL.to_vec(),
            rules: vec![],
            default_action: Action::Permit,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Restrict the enabled query types.
    pub fn with_query_types(mut self, query_types: impl IntoIterator<Item = QueryType>) -> Self {
        self.query_types = query_types.into_iter().collect();
        self
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the default action.
    pub fn with_default_action(mut self, action: Action) -> Self {
        self.default_action = action;
        self
    }

    /// Whether this is the global routing table.
    pub fn is_default(&self) -> bool {
        self.name == Self::DEFAULT_NAME
    }

    /// Whether a query type is enabled.
    pub fn enables(&self, query_type: QueryType) -> bool {
        self.query_types.contains(&query_type)
    }

    /// API-facing view.
    pub fn view(&self) -> VrfView {
        VrfView {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            query_types: self.query_types.clone(),
        }
    }
}

/// Public description of a VRF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfView {
    pub name: String,
    pub display_name: String,
    pub query_types: Vec<QueryType>,
}
