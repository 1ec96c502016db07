//! Built-in vendor platform implementations.

pub mod arista_eos;
pub mod bird;
pub mod cisco_ios;
pub mod cisco_xr;
pub mod frr;
pub mod juniper;
pub mod linux;
