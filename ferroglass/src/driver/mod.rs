//! Device driver: runs commands on a router CLI over SSH.
//!
//! The driver layer sits on top of [`transport`](crate::transport) and
//! [`channel`](crate::channel) and is what the SSH session adapter uses to
//! execute a query's commands.

mod device;
mod response;

pub use device::DeviceDriver;
pub use response::Response;
