//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::{PlatformFamily, VendorBehavior};
use crate::command::CommandTemplate;
use crate::model::QueryType;
use crate::parse::ParserKind;

/// Platform definition containing all vendor-specific configuration.
///
/// Couples what to send (command templates per query type), how to talk to
/// the CLI (prompt, failure strings, session setup) and how to read the
/// answer (parser per query type).
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform family.
    pub family: PlatformFamily,

    /// Pattern matching the operational-mode prompt.
    pub prompt_pattern: Regex,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Command template per supported query type.
    pub templates: IndexMap<QueryType, CommandTemplate>,

    /// Structured parser per query type. Missing entries fall back to raw.
    pub parsers: IndexMap<QueryType, ParserKind>,

    /// Optional vendor-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with its prompt pattern.
    pub fn new(family: PlatformFamily, prompt_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            family,
            prompt_pattern: Regex::new(prompt_pattern)?,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            templates: IndexMap::new(),
            parsers: IndexMap::new(),
            behavior: None,
        })
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Set the command template for a query type.
    pub fn with_template(mut self, query_type: QueryType, template: CommandTemplate) -> Self {
        self.templates.insert(query_type, template);
        self
    }

    /// Set the output parser for a query type.
    pub fn with_parser(mut self, query_type: QueryType, parser: ParserKind) -> Self {
        self.parsers.insert(query_type, parser);
        self
    }

    /// Whether the platform has a template for the query type.
    pub fn supports(&self, query_type: QueryType) -> bool {
        self.templates.contains_key(&query_type)
    }

    /// First failure pattern contained in the output.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("family", &self.family)
            .field("prompt_pattern", &self.prompt_pattern.as_str())
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .field("parsers", &self.parsers)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}
