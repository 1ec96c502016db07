//! Per-VRF access-control policy.
//!
//! Rules are evaluated in declaration order and the first rule that is in
//! scope for the query type and matches the target decides. There is no
//! longest-prefix tie-break: a broad rule declared before a narrower one
//! shadows it, so operators order rules most-specific-first.

mod engine;
mod rule;

pub use engine::{Decision, DenyReason, evaluate, first_match};
pub use rule::{Action, Matcher, Rule};
