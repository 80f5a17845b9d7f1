//! Template Registry
//!
//! Holds named parameter templates verbatim. Registration rejects duplicate
//! names; resolution is a pure lookup that either returns the stored record
//! or fails with a structured error. Content validation belongs to the
//! entity builder, which checks the resolved values against the node that
//! consumes them.

use indexmap::IndexMap;
use tracing::debug;

use crate::config::TemplateRecord;
use crate::error::{Result, TopologyError};

/// Registry of parameter templates, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateRegistry {
    templates: IndexMap<String, TemplateRecord>,
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a config's template section
    pub fn from_config(templates: &IndexMap<String, TemplateRecord>) -> Result<Self> {
        let mut registry = Self::new();
        for (name, record) in templates {
            registry.register(name, record.clone())?;
        }
        Ok(registry)
    }

    /// Register a template under a unique name
    pub fn register(&mut self, name: impl Into<String>, record: TemplateRecord) -> Result<()> {
        let name = name.into();
        if self.templates.contains_key(&name) {
            return Err(TopologyError::duplicate_template(name));
        }
        debug!("registered template '{}'", name);
        self.templates.insert(name, record);
        Ok(())
    }

    /// Resolve a template by name
    pub fn resolve(&self, name: &str) -> Result<&TemplateRecord> {
        self.templates
            .get(name)
            .ok_or_else(|| TopologyError::unknown_template(name))
    }

    /// Look up a template by name
    pub fn get(&self, name: &str) -> Option<&TemplateRecord> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|name| name.as_str())
    }

    /// Registered templates in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateRecord)> {
        self.templates
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }
}
