//! Query types, incoming requests and validated queries.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Device, Target, Vrf};

/// Kind of diagnostic a user can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    BgpRoute,
    BgpCommunity,
    BgpAspath,
    Ping,
    Traceroute,
}

impl QueryType {
    /// All query types, in display order.
    pub const ALL: [QueryType; 5] = [
        QueryType::BgpRoute,
        QueryType::BgpCommunity,
        QueryType::BgpAspath,
        QueryType::Ping,
        QueryType::Traceroute,
    ];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::BgpRoute => "bgp_route",
            QueryType::BgpCommunity => "bgp_community",
            QueryType::BgpAspath => "bgp_aspath",
            QueryType::Ping => "ping",
            QueryType::Traceroute => "traceroute",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            QueryType::BgpRoute => "BGP Route",
            QueryType::BgpCommunity => "BGP Community",
            QueryType::BgpAspath => "BGP AS Path",
            QueryType::Ping => "Ping",
            QueryType::Traceroute => "Traceroute",
        }
    }

    /// Whether results are routing-table rows.
    pub fn is_route_lookup(&self) -> bool {
        matches!(
            self,
            QueryType::BgpRoute | QueryType::BgpCommunity | QueryType::BgpAspath
        )
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown query type identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown query type '{0}'")]
pub struct ParseQueryTypeError(String);

impl FromStr for QueryType {
    type Err = ParseQueryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .into_iter()
            .find(|qt| qt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseQueryTypeError(s.to_string()))
    }
}

/// A query as submitted by the API layer, before validation.
///
/// The API layer has already checked request shape; nothing here has been
/// checked against syntax or policy yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_type: QueryType,
    pub target: String,
    pub vrf: String,
    pub devices: Vec<String>,
}

impl QueryRequest {
    /// Create a request against the default VRF with no devices selected.
    pub fn new(query_type: QueryType, target: impl Into<String>) -> Self {
        Self {
            query_type,
            target: target.into(),
            vrf: Vrf::DEFAULT_NAME.to_string(),
            devices: vec![],
        }
    }

    /// Set the VRF.
    pub fn vrf(mut self, vrf: impl Into<String>) -> Self {
        self.vrf = vrf.into();
        self
    }

    /// Add a device.
    pub fn device(mut self, name: impl Into<String>) -> Self {
        self.devices.push(name.into());
        self
    }

    /// Add several devices.
    pub fn devices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices.extend(names.into_iter().map(Into::into));
        self
    }
}

/// A validated, policy-approved unit of work.
///
/// Only constructed by [`LookingGlass`](crate::LookingGlass) after the target
/// parsed and every device passed policy; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Query {
    query_type: QueryType,
    target: Target,
    vrf: Arc<Vrf>,
    devices: Vec<Arc<Device>>,
}

impl Query {
    pub(crate) fn new(
        query_type: QueryType,
        target: Target,
        vrf: Arc<Vrf>,
        devices: Vec<Arc<Device>>,
    ) -> Self {
        Self {
            query_type,
            target,
            vrf,
            devices,
        }
    }

    /// Query type.
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Canonical target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// VRF the query runs in.
    pub fn vrf(&self) -> &Vrf {
        &self.vrf
    }

    /// Devices in request order.
    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    /// Device names in request order.
    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name.as_str()).collect()
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} {} vrf {} on [{}]",
            self.query_type,
            self.target,
            self.vrf.name,
            self.device_names().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_round_trip_names() {
        for qt in QueryType::ALL {
            assert_eq!(qt.as_str().parse::<QueryType>().unwrap(), qt);
        }
        assert_eq!("BGP_ROUTE".parse::<QueryType>().unwrap(), QueryType::BgpRoute);
        assert!("bgp_routes".parse::<QueryType>().is_err());
    }

    #[test]
    fn test_query_type_serde_names() {
        let qt: QueryType = serde_yaml::from_str("bgp_aspath").unwrap();
        assert_eq!(qt, QueryType::BgpAspath);
        assert!(QueryType::Traceroute.display_name().contains("Trace"));
        assert!(QueryType::BgpCommunity.is_route_lookup());
        assert!(!QueryType::Ping.is_route_lookup());
    }

    #[test]
    fn test_request_builder() {
        let req = QueryRequest::new(QueryType::Ping, "8.8.8.8")
            .vrf("customer-a")
            .device("r1")
            .devices(["r2", "r3"]);
        assert_eq!(req.vrf, "customer-a");
        assert_eq!(req.devices, vec!["r1", "r2", "r3"]);
    }
}
