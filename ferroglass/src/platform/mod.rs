//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including
//! prompt patterns, command templates, output parsers and device behavior.

mod definition;
mod family;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use family::PlatformFamily;
pub use registry::PlatformRegistry;

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        default_normalize(raw, command)
    }

    /// Post-process normalized output (drop vendor noise lines).
    fn post_process_output(&self, output: &str) -> String {
        output.to_string()
    }
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}

/// Strip the echoed command from the start and the prompt line from the end.
pub fn default_normalize(raw: &str, command: &str) -> String {
    let output = raw.trim_start();
    let output = output
        .strip_prefix(command)
        .unwrap_or(output)
        .trim_start_matches(['\r', '\n']);

    // The prompt is always the last line; the buffer is cut right after it.
    match memchr::memrchr(b'\n', output.as_bytes()) {
        Some(pos) => output[..pos].trim_end_matches('\r').to_string(),
        None => String::new(),
    }
}
