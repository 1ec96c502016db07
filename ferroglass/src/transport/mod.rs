//! SSH transport layer wrapping russh.
//!
//! Connection setup (direct or through a jump host), host key checking,
//! authentication and PTY channel creation.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
