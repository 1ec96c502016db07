//! Per-device outcomes and the aggregated response envelope.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Device, QueryType};
use crate::error::DeviceError;

/// One route as reported by a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub active: bool,
    pub protocol: Option<String>,
    pub next_hop: Option<String>,
    pub peer: Option<String>,
    pub as_path: Vec<u32>,
    pub communities: Vec<String>,
    pub local_pref: Option<u32>,
    pub med: Option<u32>,
    pub age: Option<String>,
}

/// Route rows plus whether any line of output was recognized.
///
/// `any_line_matched == true` with no routes is a genuinely empty table;
/// `false` means the device said something none of the rules understood.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub routes: Vec<RouteEntry>,
    pub any_line_matched: bool,
}

/// Ping summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    pub transmitted: u32,
    pub received: u32,
    pub loss_percent: f64,
    pub rtt_min_ms: Option<f64>,
    pub rtt_avg_ms: Option<f64>,
    pub rtt_max_ms: Option<f64>,
    pub any_line_matched: bool,
}

/// One traceroute hop. `None` RTTs are probes that timed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracerouteHop {
    pub hop: u32,
    pub host: Option<String>,
    pub address: Option<String>,
    pub rtts_ms: Vec<Option<f64>>,
}

/// Traceroute hop list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceroutePath {
    pub hops: Vec<TracerouteHop>,
    pub any_line_matched: bool,
}

/// Normalized output for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum StructuredResult {
    /// Routing-table rows (`bgp_route`, `bgp_community`, `bgp_aspath`).
    Routes {
        query_type: QueryType,
        table: RouteTable,
    },

    /// Ping statistics.
    Ping { stats: PingStats },

    /// Traceroute hops.
    Traceroute { path: TraceroutePath },

    /// Unmodified output; no structured extractor exists for the pair.
    Raw { query_type: QueryType, output: String },
}

impl StructuredResult {
    /// Query type this result answers.
    pub fn query_type(&self) -> QueryType {
        match self {
            StructuredResult::Routes { query_type, .. } | StructuredResult::Raw { query_type, .. } => {
                *query_type
            }
            StructuredResult::Ping { .. } => QueryType::Ping,
            StructuredResult::Traceroute { .. } => QueryType::Traceroute,
        }
    }

    /// Whether output was passed through as raw text.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StructuredResult::Raw { .. })
    }

    /// Whether any line of the output was recognized (always true for raw).
    pub fn any_line_matched(&self) -> bool {
        match self {
            StructuredResult::Routes { table, .. } => table.any_line_matched,
            StructuredResult::Ping { stats } => stats.any_line_matched,
            StructuredResult::Traceroute { path } => path.any_line_matched,
            StructuredResult::Raw { .. } => true,
        }
    }
}

/// Success or failure of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Success(StructuredResult),
    Failure(DeviceError),
}

impl Outcome {
    /// Whether the device produced a result.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// One envelope entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResult {
    pub device: String,
    pub display_name: String,
    pub commands: Vec<String>,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

/// Raw outcome of running commands on one device.
///
/// Lives only for the duration of one dispatch.
#[derive(Debug)]
pub struct RawResult {
    pub device: Arc<Device>,
    pub commands: Vec<String>,
    pub output: Result<Vec<String>, DeviceError>,
    pub elapsed: Duration,
}

/// Aggregated answer to one query; the unit stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Cache fingerprint of the query.
    pub id: String,

    pub query_type: QueryType,
    pub target: String,
    pub vrf: String,

    /// Entries in request device order.
    pub results: Vec<DeviceResult>,

    /// Wall-clock time spent dispatching; zero for cache hits.
    pub runtime_ms: u64,

    /// Seconds since the UNIX epoch when the results were produced.
    pub timestamp: u64,

    pub cached: bool,
}

impl ResponseEnvelope {
    /// Entry for a device.
    pub fn result_for(&self, device: &str) -> Option<&DeviceResult> {
        self.results.iter().find(|r| r.device == device)
    }

    /// Number of successful entries.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Whether some, but not all, devices failed.
    pub fn is_partial(&self) -> bool {
        let ok = self.success_count();
        ok > 0 && ok < self.results.len()
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
