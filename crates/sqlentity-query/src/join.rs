//! JOIN clause rendering.

use sqlentity_core::{EntityLocation, EntityRelation, NameQualifier};

/// Renders one relation edge as a JOIN line.
#[derive(Debug, Clone, Copy)]
pub struct JoinClause<'a> {
    relation: &'a EntityRelation,
}

impl<'a> JoinClause<'a> {
    pub fn new(relation: &'a EntityRelation) -> Self {
        Self { relation }
    }

    /// `{KIND} {table} [AS alias] ON {source} = {target}`.
    ///
    /// `root` replaces the root location on the source side when the
    /// statement reads from a derived source.
    pub fn to_sql(&self, qualifier: &dyn NameQualifier, root: Option<&Remap<'_>>) -> String {
        let relation = self.relation;
        let source_location = root.map_or(&relation.source_location, |r| {
            r.apply(&relation.source_location)
        });
        format!(
            "{} {} ON {} = {}",
            relation.join_type.as_str(),
            qualifier.table_source(&relation.relation_location),
            qualifier.qualified_column(source_location, relation.source_attribute.physical_name),
            qualifier.qualified_column(
                &relation.relation_location,
                relation.relation_attribute.physical_name
            ),
        )
    }

    /// Render every edge in order, one per line.
    pub fn create(
        relations: &[EntityRelation],
        qualifier: &dyn NameQualifier,
        root: Option<&Remap<'_>>,
    ) -> Option<String> {
        if relations.is_empty() {
            return None;
        }
        let lines: Vec<String> = relations
            .iter()
            .map(|relation| JoinClause::new(relation).to_sql(qualifier, root))
            .collect();
        Some(lines.join("\n"))
    }
}

/// Substitutes one location for another while qualifying names.
#[derive(Debug, Clone, Copy)]
pub struct Remap<'a> {
    pub from: &'a EntityLocation,
    pub to: &'a EntityLocation,
}

impl<'a> Remap<'a> {
    pub fn apply<'b>(&self, location: &'b EntityLocation) -> &'b EntityLocation
    where
        'a: 'b,
    {
        if location == self.from { self.to } else { location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlentity_core::{
        EntityAttributeDefinition, EntityAttributeTypes, JoinType, TransactSqlQualifier,
    };
    use std::sync::Arc;

    fn column(location: &EntityLocation, name: &'static str) -> Arc<EntityAttributeDefinition> {
        Arc::new(EntityAttributeDefinition {
            path: vec![location.clone()],
            relation_path: Vec::new(),
            property_name: name,
            physical_name: name,
            alias: None,
            attribute_types: EntityAttributeTypes::DIRECT_ATTRIBUTE,
            ordinal: 0,
            reference_name: name.to_string(),
        })
    }

    #[test]
    fn test_inner_join() {
        let data = EntityLocation::new("FakeData", "dbo", "FakeData");
        let related = EntityLocation::new("FakeRelated", "dbo", "FakeRelated");
        let relation = EntityRelation::new(
            JoinType::Inner,
            column(&data, "FakeRelatedId"),
            column(&related, "FakeRelatedId"),
        );

        let sql = JoinClause::new(&relation).to_sql(&TransactSqlQualifier, None);
        assert_eq!(
            sql,
            "INNER JOIN [dbo].[FakeRelated] ON [dbo].[FakeData].[FakeRelatedId] = [dbo].[FakeRelated].[FakeRelatedId]"
        );
    }

    #[test]
    fn test_aliased_left_join() {
        let data = EntityLocation::new("FakeData", "dbo", "FakeData");
        let related = EntityLocation::new("FakeRelated", "dbo", "FakeRelated");
        let relation = EntityRelation::new(
            JoinType::Left,
            column(&data, "FakeRelatedId"),
            column(&related, "FakeRelatedId"),
        )
        .with_aliases(None, Some("OtherAlias"));

        let sql = JoinClause::new(&relation).to_sql(&TransactSqlQualifier, None);
        assert_eq!(
            sql,
            "LEFT JOIN [dbo].[FakeRelated] AS [OtherAlias] ON [dbo].[FakeData].[FakeRelatedId] = [OtherAlias].[FakeRelatedId]"
        );
    }

    #[test]
    fn test_create_keeps_order() {
        let data = EntityLocation::new("FakeData", "dbo", "FakeData");
        let related = EntityLocation::new("FakeRelated", "dbo", "FakeRelated");
        let first = EntityRelation::new(
            JoinType::Inner,
            column(&data, "FakeRelatedId"),
            column(&related, "FakeRelatedId"),
        )
        .with_aliases(None, Some("Related"));
        let second = EntityRelation::new(
            JoinType::Left,
            column(&related, "FakeDependencyId"),
            column(&related, "FakeRelatedId"),
        )
        .with_aliases(Some("Related"), Some("RelatedDependency"));

        let sql = JoinClause::create(&[first, second], &TransactSqlQualifier, None).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("INNER JOIN [dbo].[FakeRelated] AS [Related]"));
        assert_eq!(
            lines[1],
            "LEFT JOIN [dbo].[FakeRelated] AS [RelatedDependency] ON [Related].[FakeDependencyId] = [RelatedDependency].[FakeRelatedId]"
        );
        assert!(JoinClause::create(&[], &TransactSqlQualifier, None).is_none());
    }

    #[test]
    fn test_remap_root() {
        let data = EntityLocation::new("FakeData", "dbo", "FakeData");
        let derived = data.clone().with_alias(Some("FakeData"));
        let related = EntityLocation::new("FakeRelated", "dbo", "FakeRelated");
        let relation = EntityRelation::new(
            JoinType::Inner,
            column(&data, "FakeRelatedId"),
            column(&related, "FakeRelatedId"),
        );
        let remap = Remap {
            from: &data,
            to: &derived,
        };
        let sql = JoinClause::new(&relation).to_sql(&TransactSqlQualifier, Some(&remap));
        assert!(sql.contains("ON [FakeData].[FakeRelatedId] = "));
    }
}
