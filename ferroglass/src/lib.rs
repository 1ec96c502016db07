//! # Ferroglass
//!
//! Looking-glass query engine for network routers.
//!
//! Ferroglass takes a user's diagnostic request (a BGP route, community or
//! AS-path lookup, a ping or a traceroute), checks it against per-VRF access
//! policy, renders the vendor command for each selected router, runs the
//! commands on all of them concurrently and returns one envelope of
//! normalized, per-device results.
//!
//! ## Features
//!
//! - Ordered first-match permit/deny rules per VRF
//! - Command templates and output parsers for Juniper, Arista EOS, Cisco IOS
//!   and IOS-XR, FRR and BIRD
//! - Concurrent fan-out with per-device and global timeouts; partial failure
//!   is a normal result
//! - Short-lived result cache keyed by a normalized query fingerprint
//! - Async SSH sessions via russh, optionally through a jump host
//! - Input and output hooks for rewriting targets and cleaning up output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferroglass::{Config, LookingGlass, QueryRequest, QueryType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferroglass::Error> {
//!     let glass = LookingGlass::from_config(Config::from_path("lg.yaml")?)?;
//!
//!     let envelope = glass
//!         .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("mx1"))
//!         .await?;
//!
//!     for result in &envelope.results {
//!         println!("{}: {:?}", result.display_name, result.outcome);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Devices are reached through the [`session::DeviceSession`] trait;
//! [`session::FakeSession`] answers from canned output for tests and
//! offline use.

pub mod cache;
pub mod channel;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod glass;
pub mod hook;
pub mod model;
pub mod parse;
pub mod platform;
pub mod policy;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use cache::{CacheConfig, Fingerprint, MemoryCache, ResultCache};
pub use config::Config;
pub use dispatch::{DispatchConfig, Dispatcher};
pub use error::{DeviceError, Error, QueryError, Result};
pub use glass::{Directory, LookingGlass};
pub use hook::{InputHook, OutputHook};
pub use model::{
    Credential, Device, DeviceResult, DeviceVrf, JumpHost, Outcome, Query, QueryRequest,
    QueryType, ResponseEnvelope, StructuredResult, Target, Vrf,
};
pub use platform::{PlatformFamily, PlatformRegistry};
pub use session::{DeviceSession, FakeSession, SshSessionAdapter};
pub use transport::{AuthMethod, SshConfig};
