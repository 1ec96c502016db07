//! Access-control rules.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Prefix, QueryType, Target};

/// What a matching rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Permit => f.write_str("permit"),
            Action::Deny => f.write_str("deny"),
        }
    }
}

/// How a rule decides whether it applies to a target.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Target prefix falls within `prefix`, with its length in `ge..=le`.
    ///
    /// `ge` defaults to the rule's own length and `le` to the family maximum.
    Network {
        prefix: Prefix,
        ge: Option<u8>,
        le: Option<u8>,
    },

    /// Canonical target equals the value (ASCII case-insensitive).
    Exact(String),

    /// Canonical target matches the regular expression.
    Pattern(Regex),
}

/// One access-control rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub action: Action,

    /// Query types the rule is scoped to; `None` applies to all.
    pub query_types: Option<Vec<QueryType>>,
}

impl Rule {
    /// Create a global rule.
    pub fn new(matcher: Matcher, action: Action) -> Self {
        Self {
            matcher,
            action,
            query_types: None,
        }
    }

    /// Network rule from a prefix string.
    pub fn network(prefix: &str, action: Action) -> Result<Self, String> {
        let prefix = prefix.parse()?;
        Ok(Self::new(
            Matcher::Network {
                prefix,
                ge: None,
                le: None,
            },
            action,
        ))
    }

    /// Exact-value rule.
    pub fn exact(value: impl Into<String>, action: Action) -> Self {
        Self::new(Matcher::Exact(value.into()), action)
    }

    /// Regular-expression rule.
    pub fn pattern(pattern: &str, action: Action) -> Result<Self, regex::Error> {
        Ok(Self::new(Matcher::Pattern(Regex::new(pattern)?), action))
    }

    /// Bound the accepted target prefix lengths of a network rule.
    pub fn with_length_range(mut self, ge: Option<u8>, le: Option<u8>) -> Self {
        if let Matcher::Network {
            ge: ref mut g,
            le: ref mut l,
            ..
        } = self.matcher
        {
            *g = ge;
            *l = le;
        }
        self
    }

    /// Scope the rule to specific query types.
    pub fn for_query_types(mut self, query_types: impl IntoIterator<Item = QueryType>) -> Self {
        self.query_types = Some(query_types.into_iter().collect());
        self
    }

    /// Whether the rule is in scope for a query type.
    pub fn applies_to(&self, query_type: QueryType) -> bool {
        self.query_types
            .as_ref()
            .is_none_or(|types| types.contains(&query_type))
    }

    /// Whether the rule matches a target.
    pub fn matches(&self, target: &Target) -> bool {
        match &self.matcher {
            Matcher::Network { prefix, ge, le } => {
                let Some(candidate) = target.as_prefix() else {
                    return false;
                };
                let max = if candidate.addr().is_ipv4() { 32 } else { 128 };
                let min_len = ge.unwrap_or(prefix.len());
                let max_len = le.unwrap_or(max);
                prefix.contains(candidate)
                    && candidate.len() >= min_len
                    && candidate.len() <= max_len
            }
            Matcher::Exact(value) => value.eq_ignore_ascii_case(&target.to_string()),
            Matcher::Pattern(re) => re.is_match(&target.to_string()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Matcher::Network { prefix, ge, le } => {
                // Always show the length on networks, even /32.
                write!(f, "{} {}/{}", self.action, prefix.addr(), prefix.len())?;
                if let Some(ge) = ge {
                    write!(f, " ge {ge}")?;
                }
                if let Some(le) = le {
                    write!(f, " le {le}")?;
                }
                Ok(())
            }
            Matcher::Exact(value) => write!(f, "{} exact {value}", self.action),
            Matcher::Pattern(re) => write!(f, "{} pattern {}", self.action, re.as_str()),
        }
    }
}
