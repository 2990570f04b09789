//! Join edges between entity locations.

use crate::attribute::EntityAttributeDefinition;
use crate::entity::JoinType;
use crate::location::EntityLocation;
use std::sync::Arc;

/// One join edge: `relation_location` is joined to an already established
/// `source_location` on `source_attribute = relation_attribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRelation {
    pub join_type: JoinType,
    pub source_attribute: Arc<EntityAttributeDefinition>,
    pub source_location: EntityLocation,
    pub relation_attribute: Arc<EntityAttributeDefinition>,
    pub relation_location: EntityLocation,
}

impl EntityRelation {
    /// Create an edge reading both locations off the attributes.
    pub fn new(
        join_type: JoinType,
        source_attribute: Arc<EntityAttributeDefinition>,
        relation_attribute: Arc<EntityAttributeDefinition>,
    ) -> Self {
        let source_location = source_attribute.resolved_location().clone();
        let relation_location = relation_attribute.resolved_location().clone();
        Self {
            join_type,
            source_attribute,
            source_location,
            relation_attribute,
            relation_location,
        }
    }

    /// Replace the location aliases of either side.
    ///
    /// Aliases given here take precedence over aliases already carried by
    /// the attributes.
    pub fn with_aliases(mut self, source_alias: Option<&str>, relation_alias: Option<&str>) -> Self {
        if source_alias.is_some() {
            self.source_location = self.source_location.with_alias(source_alias);
        }
        if relation_alias.is_some() {
            self.relation_location = self.relation_location.with_alias(relation_alias);
        }
        self
    }
}
