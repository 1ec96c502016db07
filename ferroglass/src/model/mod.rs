//! Shared data model: devices, VRFs, queries and results.

mod device;
mod query;
mod result;
mod target;
mod vrf;

pub use device::{Credential, Device, DeviceView, DeviceVrf, JumpHost};
pub use query::{ParseQueryTypeError, Query, QueryRequest, QueryType};
pub(crate) use result::millis;
pub use result::{
    DeviceResult, Outcome, PingStats, RawResult, ResponseEnvelope, RouteEntry, RouteTable,
    StructuredResult, TracerouteHop, TraceroutePath,
};
pub use target::{AddressFamily, Prefix, Target};
pub use vrf::{Vrf, VrfView};
