//! Dialect-specific name qualification.
//!
//! All identifier quoting, placeholder syntax and row limiting flows through
//! [`NameQualifier`]; compilers never format identifiers themselves.

use crate::attribute::EntityAttributeDefinition;
use crate::location::EntityLocation;
use std::fmt::Debug;

/// Formats names and dialect fragments for one SQL dialect.
pub trait NameQualifier: Send + Sync + Debug {
    /// Quote a single identifier.
    fn escape(&self, name: &str) -> String;

    /// Placeholder for the parameter at zero-based `index`.
    fn parameter(&self, index: usize) -> String;

    /// Fragment placed right after `SELECT` to limit rows, if the dialect
    /// limits that way.
    fn row_limit_prefix(&self, _limit: usize) -> Option<String> {
        None
    }

    /// Fragment appended after the statement body to limit rows, if the
    /// dialect limits that way.
    fn row_limit_suffix(&self, _limit: usize) -> Option<String> {
        None
    }

    /// Wrap a `SELECT 1 ...` body into a statement returning 1 or 0.
    fn exists_statement(&self, body: &str) -> String;

    /// Name a location is referred to by: its alias, else its table.
    fn table_name(&self, location: &EntityLocation) -> String {
        match &location.alias {
            Some(alias) => self.escape(alias),
            None => self.canonical_table_name(location),
        }
    }

    /// `container.table`, regardless of alias.
    fn canonical_table_name(&self, location: &EntityLocation) -> String {
        format!(
            "{}.{}",
            self.escape(&location.container),
            self.escape(location.name)
        )
    }

    /// Table reference as written in FROM and JOIN clauses.
    fn table_source(&self, location: &EntityLocation) -> String {
        match &location.alias {
            Some(alias) => format!(
                "{} AS {}",
                self.canonical_table_name(location),
                self.escape(alias)
            ),
            None => self.canonical_table_name(location),
        }
    }

    fn qualified_column(&self, location: &EntityLocation, column: &str) -> String {
        format!("{}.{}", self.table_name(location), self.escape(column))
    }

    /// Column qualified by the location it is read from.
    fn qualified_name(&self, attribute: &EntityAttributeDefinition) -> String {
        self.qualified_column(attribute.resolved_location(), attribute.physical_name)
    }

    /// Column qualified by its table, regardless of alias.
    fn canonical_name(&self, attribute: &EntityAttributeDefinition) -> String {
        format!(
            "{}.{}",
            self.canonical_table_name(attribute.resolved_location()),
            self.escape(attribute.physical_name)
        )
    }

    /// Projection of an attribute, aliased to its reference name when that
    /// differs from the physical name.
    fn select_column(&self, attribute: &EntityAttributeDefinition) -> String {
        let qualified = self.qualified_name(attribute);
        match &attribute.alias {
            Some(alias) => format!("{} AS {}", qualified, self.escape(alias)),
            None => qualified,
        }
    }
}

/// T-SQL: `[bracket]` quoting, `@0` placeholders and `TOP (n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactSqlQualifier;

impl NameQualifier for TransactSqlQualifier {
    fn escape(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn parameter(&self, index: usize) -> String {
        format!("@{index}")
    }

    fn row_limit_prefix(&self, limit: usize) -> Option<String> {
        Some(format!("TOP ({limit})"))
    }

    fn exists_statement(&self, body: &str) -> String {
        format!("IF EXISTS ({body}) SELECT 1 ELSE SELECT 0")
    }
}

/// PostgreSQL: `"double"` quoting, `$1` placeholders, `LIMIT n` and `SELECT EXISTS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlQualifier;

impl NameQualifier for PostgreSqlQualifier {
    fn escape(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn parameter(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn row_limit_suffix(&self, limit: usize) -> Option<String> {
        Some(format!("LIMIT {limit}"))
    }

    fn exists_statement(&self, body: &str) -> String {
        format!("SELECT EXISTS ({body})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::EntityAttributeTypes;

    fn attribute(alias: Option<&str>) -> EntityAttributeDefinition {
        let root = EntityLocation::new("FakeData", "dbo", "FakeData");
        let related = EntityLocation::new("FakeRelated", "dbo", "FakeRelated");
        EntityAttributeDefinition {
            path: vec![root, related.with_alias(alias)],
            relation_path: Vec::new(),
            property_name: "RelatedProperty",
            physical_name: "RelatedProperty",
            alias: Some("RelatedAlias".to_string()),
            attribute_types: EntityAttributeTypes::RELATED_ATTRIBUTE,
            ordinal: 0,
            reference_name: "RelatedAlias".to_string(),
        }
    }

    #[test]
    fn test_transact_sql_escaping() {
        let q = TransactSqlQualifier;
        assert_eq!(q.escape("Name"), "[Name]");
        assert_eq!(q.escape("Odd]Name"), "[Odd]]Name]");
        assert_eq!(q.parameter(3), "@3");
    }

    #[test]
    fn test_alias_qualifies_columns() {
        let q = TransactSqlQualifier;
        let aliased = attribute(Some("Related"));
        assert_eq!(q.qualified_name(&aliased), "[Related].[RelatedProperty]");
        assert_eq!(q.canonical_name(&aliased), "[dbo].[FakeRelated].[RelatedProperty]");
        assert_eq!(
            q.table_source(aliased.resolved_location()),
            "[dbo].[FakeRelated] AS [Related]"
        );

        let plain = attribute(None);
        assert_eq!(q.qualified_name(&plain), "[dbo].[FakeRelated].[RelatedProperty]");
        assert_eq!(
            q.select_column(&plain),
            "[dbo].[FakeRelated].[RelatedProperty] AS [RelatedAlias]"
        );
    }

    #[test]
    fn test_postgres_fragments() {
        let q = PostgreSqlQualifier;
        assert_eq!(q.escape("Name"), "\"Name\"");
        assert_eq!(q.parameter(0), "$1");
        assert_eq!(q.row_limit_prefix(5), None);
        assert_eq!(q.row_limit_suffix(5).as_deref(), Some("LIMIT 5"));
        assert_eq!(
            q.exists_statement("SELECT 1"),
            "SELECT EXISTS (SELECT 1)"
        );
    }
}
