//! Command construction: templates and the per-device builder.

mod builder;
mod template;

pub use builder::CommandBuilder;
pub use template::{Afi, CommandTemplate, TemplateLine};
