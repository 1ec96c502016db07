//! Registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::definition::PlatformDefinition;
use super::{PlatformFamily, vendors};
use crate::command::CommandTemplate;
use crate::error::ConfigError;
use crate::model::QueryType;
use crate::parse::ParserKind;

/// Built-in platforms, compiled once per process.
static BUILTIN: LazyLock<Arc<PlatformRegistry>> =
    LazyLock::new(|| Arc::new(PlatformRegistry::with_builtin_platforms()));

/// Registry for platform definitions.
///
/// Read-only once handed to a looking glass; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<PlatformFamily, Arc<PlatformDefinition>>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// The shared registry of built-in platforms.
    pub fn builtin() -> Arc<PlatformRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// A fresh registry holding every built-in platform.
    pub fn with_builtin_platforms() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::juniper::platform(),
            vendors::arista_eos::platform(),
            vendors::cisco_ios::platform(),
            vendors::cisco_xr::platform(),
            vendors::frr::platform(),
            vendors::bird::platform(),
        ] {
            registry
                .platforms
                .insert(platform.family, Arc::new(platform));
        }
        registry
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<(), ConfigError> {
        if self.platforms.contains_key(&platform.family) {
            return Err(ConfigError::Duplicate {
                kind: "platform",
                name: platform.family.to_string(),
            });
        }
        self.platforms.insert(platform.family, Arc::new(platform));
        Ok(())
    }

    /// Get a platform by family.
    pub fn get(&self, family: PlatformFamily) -> Option<&Arc<PlatformDefinition>> {
        self.platforms.get(&family)
    }

    /// Check if a platform is registered.
    pub fn contains(&self, family: PlatformFamily) -> bool {
        self.platforms.contains_key(&family)
    }

    /// Command template for a (platform, query type) pair.
    pub fn template(&self, family: PlatformFamily, query_type: QueryType) -> Option<&CommandTemplate> {
        self.get(family)?.templates.get(&query_type)
    }

    /// Structured parser for a (platform, query type) pair.
    pub fn parser(&self, family: PlatformFamily, query_type: QueryType) -> Option<ParserKind> {
        self.get(family)?.parsers.get(&query_type).copied()
    }

    /// List all registered families.
    pub fn families(&self) -> impl Iterator<Item = PlatformFamily> + '_ {
        self.platforms.keys().copied()
    }
}
