//! Extension points around a query.
//!
//! An [`InputHook`] sees the raw target of every request before it is parsed
//! and checked against policy. It may rewrite the target or reject the
//! request outright. An [`OutputHook`] sees each command output of each
//! device before it is parsed; returning an error turns that device's entry
//! into a failure.
//!
//! Hooks run in registration order. Closures with the matching signature
//! are hooks too:
//!
//! ```rust
//! use ferroglass::hook::InputHook;
//! use ferroglass::{QueryError, QueryType};
//!
//! let upper = |_: QueryType, target: String| -> Result<String, QueryError> {
//!     Ok(target.to_uppercase())
//! };
//! assert_eq!(upper.rewrite(QueryType::BgpCommunity, "no-export".into()).unwrap(), "NO-EXPORT");
//! ```

use regex::Regex;

use crate::error::{DeviceError, QueryError};
use crate::model::{Device, QueryType};

/// Rewrites or rejects a request target.
pub trait InputHook: Send + Sync {
    /// Return the target to use, or a rejection.
    fn rewrite(&self, query_type: QueryType, target: String) -> Result<String, QueryError>;
}

impl<F> InputHook for F
where
    F: Fn(QueryType, String) -> Result<String, QueryError> + Send + Sync,
{
    fn rewrite(&self, query_type: QueryType, target: String) -> Result<String, QueryError> {
        self(query_type, target)
    }
}

/// Post-processes one command output of one device.
pub trait OutputHook: Send + Sync {
    fn process(
        &self,
        device: &Device,
        query_type: QueryType,
        output: String,
    ) -> Result<String, DeviceError>;
}

impl<F> OutputHook for F
where
    F: Fn(&Device, QueryType, String) -> Result<String, DeviceError> + Send + Sync,
{
    fn process(
        &self,
        device: &Device,
        query_type: QueryType,
        output: String,
    ) -> Result<String, DeviceError> {
        self(device, query_type, output)
    }
}

/// Drops output lines matching a pattern, e.g. banners or licence nags
/// some platforms print before every answer.
#[derive(Debug, Clone)]
pub struct DropLines {
    pattern: Regex,
}

impl DropLines {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl OutputHook for DropLines {
    fn process(&self, _: &Device, _: QueryType, output: String) -> Result<String, DeviceError> {
        if !output.lines().any(|line| self.pattern.is_match(line)) {
            return Ok(output);
        }
        let kept: Vec<&str> = output
            .lines()
            .filter(|line| !self.pattern.is_match(line))
            .collect();
        Ok(kept.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::Credential;
    use crate::platform::PlatformFamily;
    use crate::transport::AuthMethod;

    fn device() -> Device {
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        Device::new("r1", "192.0.2.1", PlatformFamily::CiscoXr, credential)
    }

    #[test]
    fn test_drop_lines() {
        let hook = DropLines::new(r"^\w{3} \w{3}\s+\d+ [\d:.]+ \w+$").unwrap();
        let output = "Fri Oct 16 10:12:01.123 UTC\nBGP routing table entry for 8.8.8.0/24\n  15169";
        let cleaned = hook
            .process(&device(), QueryType::BgpRoute, output.to_string())
            .unwrap();
        assert_eq!(cleaned, "BGP routing table entry for 8.8.8.0/24\n  15169");

        let untouched = "Paths: (1 available)\r\n";
        assert_eq!(
            hook.process(&device(), QueryType::BgpRoute, untouched.to_string())
                .unwrap(),
            untouched
        );
    }

    #[test]
    fn test_closure_hooks() {
        let reject = |query_type: QueryType, target: String| -> Result<String, QueryError> {
            Err(QueryError::InvalidTarget {
                query_type,
                target,
                reason: "blocked".to_string(),
            })
        };
        assert!(matches!(
            reject.rewrite(QueryType::Ping, "8.8.8.8".to_string()),
            Err(QueryError::InvalidTarget { .. })
        ));

        let tag = |device: &Device, _: QueryType, output: String| -> Result<String, DeviceError> {
            Ok(format!("{}: {output}", device.name))
        };
        assert_eq!(
            tag.process(&device(), QueryType::Ping, "ok".to_string()).unwrap(),
            "r1: ok"
        );
    }
}
