//! Resolver configuration.

/// Settings applied while resolving entity declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Schema used for entities that do not declare one
    pub default_container: String,
    /// Deepest relation nesting accepted, counted from the root entity
    pub max_relation_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_container: "dbo".to_string(),
            max_relation_depth: 16,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default schema.
    pub fn default_container(mut self, container: impl Into<String>) -> Self {
        self.default_container = container.into();
        self
    }

    /// Set the maximum relation depth.
    pub fn max_relation_depth(mut self, depth: usize) -> Self {
        self.max_relation_depth = depth;
        self
    }

    /// The schema to use for a declared container.
    pub fn container_or_default<'a>(&'a self, declared: &'a str) -> &'a str {
        if declared.is_empty() {
            &self.default_container
        } else {
            declared
        }
    }
}
