//! Table participation identities.

use std::fmt;

/// A physical or aliased participation of a table in a statement.
///
/// Two locations are equal only when entity, container, table and alias all
/// match, so the same table joined under an alias is a distinct participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityLocation {
    /// Logical entity name
    pub entity: &'static str,
    /// Schema name
    pub container: String,
    /// Table name
    pub name: &'static str,
    pub alias: Option<String>,
}

impl EntityLocation {
    pub fn new(entity: &'static str, container: impl Into<String>, name: &'static str) -> Self {
        Self {
            entity,
            container: container.into(),
            name,
            alias: None,
        }
    }

    /// The same table participating under `alias`.
    pub fn with_alias(mut self, alias: Option<&str>) -> Self {
        self.alias = alias.map(str::to_string);
        self
    }

    /// Whether both locations refer to the same table, ignoring aliases.
    pub fn same_table(&self, other: &EntityLocation) -> bool {
        self.container == other.container && self.name == other.name
    }

    /// Whether both locations would expose the same name in one FROM clause.
    pub fn collides_with(&self, other: &EntityLocation) -> bool {
        match (&self.alias, &other.alias) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => self.same_table(other),
            _ => false,
        }
    }
}

impl fmt::Display for EntityLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container, self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}
