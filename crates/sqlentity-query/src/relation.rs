//! Ordered, immutable sets of join edges.

use sqlentity_core::{
    Attr, Entity, EntityDefinition, EntityDefinitionProvider, EntityLocation, EntityRelation,
    Error, JoinType, LookupErrorKind, Result,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The joins of a selection rooted at `T`, in JOIN order.
///
/// Built through [`EntityRelationSetBuilder`]; every edge joins a new
/// location to one that is already part of the set. Entities named by later
/// joins are resolved through the same provider as the root.
pub struct EntityRelationSet<T> {
    provider: Arc<EntityDefinitionProvider>,
    root: EntityLocation,
    relations: Vec<EntityRelation>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityRelationSet<T> {
    /// A set without any joins.
    pub fn empty() -> Result<Self> {
        Self::empty_with(EntityDefinitionProvider::shared())
    }

    /// A set without any joins, resolved through `provider`.
    pub fn empty_with(provider: Arc<EntityDefinitionProvider>) -> Result<Self> {
        let definition = provider.resolve::<T>()?;
        Ok(Self {
            provider,
            root: definition.location().clone(),
            relations: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// The joins implied by `T`'s relation properties.
    pub fn from_definition() -> Result<Self> {
        Self::from_provider(EntityDefinitionProvider::shared())
    }

    /// The joins implied by `T`'s relation properties, resolved through
    /// `provider`.
    pub fn from_provider(provider: Arc<EntityDefinitionProvider>) -> Result<Self> {
        let definition = provider.resolve::<T>()?;
        Ok(Self::with_definition(provider, &definition))
    }

    pub(crate) fn with_definition(
        provider: Arc<EntityDefinitionProvider>,
        definition: &EntityDefinition,
    ) -> Self {
        Self {
            provider,
            root: definition.location().clone(),
            relations: definition.default_relations().to_vec(),
            _marker: PhantomData,
        }
    }

    /// Start building a set on top of `T`'s own relations.
    pub fn builder() -> Result<EntityRelationSetBuilder<T>> {
        Ok(Self::from_definition()?.into_builder())
    }
}

impl<T> EntityRelationSet<T> {
    pub fn relations(&self) -> &[EntityRelation] {
        &self.relations
    }

    pub fn root(&self) -> &EntityLocation {
        &self.root
    }

    /// The provider joined entities are resolved through.
    pub fn provider(&self) -> &Arc<EntityDefinitionProvider> {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Every location the set establishes, root first.
    pub fn locations(&self) -> impl Iterator<Item = &EntityLocation> {
        std::iter::once(&self.root).chain(self.relations.iter().map(|r| &r.relation_location))
    }

    /// Whether `location` takes part in the statement.
    pub fn contains_location(&self, location: &EntityLocation) -> bool {
        self.locations().any(|l| l == location)
    }

    /// Continue building from this set.
    pub fn into_builder(self) -> EntityRelationSetBuilder<T> {
        EntityRelationSetBuilder {
            provider: self.provider,
            root: self.root,
            relations: self.relations,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for EntityRelationSet<T> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            root: self.root.clone(),
            relations: self.relations.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for EntityRelationSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRelationSet")
            .field("root", &self.root)
            .field("relations", &self.relations)
            .finish()
    }
}

/// Accumulates join edges in call order.
pub struct EntityRelationSetBuilder<T> {
    provider: Arc<EntityDefinitionProvider>,
    root: EntityLocation,
    relations: Vec<EntityRelation>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityRelationSetBuilder<T> {
    /// INNER JOIN `R` on `source = relation`.
    pub fn inner_join<R: Entity>(self, source: Attr<T>, relation: Attr<R>) -> Result<Self> {
        self.join(JoinType::Inner, source, None, relation, None)
    }

    /// LEFT JOIN `R` on `source = relation`.
    pub fn left_join<R: Entity>(self, source: Attr<T>, relation: Attr<R>) -> Result<Self> {
        self.join(JoinType::Left, source, None, relation, None)
    }

    /// INNER JOIN `R` under `alias`.
    pub fn inner_join_as<R: Entity>(
        self,
        source: Attr<T>,
        relation: Attr<R>,
        alias: &str,
    ) -> Result<Self> {
        self.join(JoinType::Inner, source, None, relation, Some(alias))
    }

    /// LEFT JOIN `R` under `alias`.
    pub fn left_join_as<R: Entity>(
        self,
        source: Attr<T>,
        relation: Attr<R>,
        alias: &str,
    ) -> Result<Self> {
        self.join(JoinType::Left, source, None, relation, Some(alias))
    }

    /// INNER JOIN `R` to a previously joined `S`.
    pub fn inner_join_from<S: Entity, R: Entity>(
        self,
        source: Attr<S>,
        source_alias: Option<&str>,
        relation: Attr<R>,
        relation_alias: Option<&str>,
    ) -> Result<Self> {
        self.join(JoinType::Inner, source, source_alias, relation, relation_alias)
    }

    /// LEFT JOIN `R` to a previously joined `S`.
    pub fn left_join_from<S: Entity, R: Entity>(
        self,
        source: Attr<S>,
        source_alias: Option<&str>,
        relation: Attr<R>,
        relation_alias: Option<&str>,
    ) -> Result<Self> {
        self.join(JoinType::Left, source, source_alias, relation, relation_alias)
    }

    /// Append one edge.
    ///
    /// The source side must resolve to a location already in the set and the
    /// relation side must be a column of `R`'s own table. Joining a location
    /// that is already present needs an alias.
    pub fn join<S: Entity, R: Entity>(
        mut self,
        join_type: JoinType,
        source: Attr<S>,
        source_alias: Option<&str>,
        relation: Attr<R>,
        relation_alias: Option<&str>,
    ) -> Result<Self> {
        let source_attribute = source.resolve_with(&self.provider)?;
        let relation_attribute = relation.resolve_with(&self.provider)?;
        if !relation_attribute.is_direct() {
            return Err(Error::argument(
                "relation",
                format!(
                    "'{}' is not a column of '{}'",
                    relation_attribute.reference_name,
                    relation_attribute.entity_location().entity
                ),
            ));
        }

        let edge = EntityRelation::new(
            join_type,
            Arc::clone(&source_attribute),
            Arc::clone(&relation_attribute),
        )
        .with_aliases(source_alias, relation_alias);

        if !self.is_established(&edge.source_location) {
            return Err(Error::lookup(
                LookupErrorKind::Location,
                edge.source_location
                    .alias
                    .clone()
                    .unwrap_or_else(|| edge.source_location.name.to_string()),
                self.root.entity,
            ));
        }
        if self.locations().any(|l| l.collides_with(&edge.relation_location)) {
            return Err(Error::argument(
                "relation",
                format!(
                    "'{}' is already joined; join it again under an alias",
                    edge.relation_location
                ),
            ));
        }

        tracing::trace!(
            join = join_type.as_str(),
            source = %edge.source_location,
            relation = %edge.relation_location,
            "Added relation"
        );
        self.relations.push(edge);
        Ok(self)
    }
}

impl<T> EntityRelationSetBuilder<T> {
    fn locations(&self) -> impl Iterator<Item = &EntityLocation> {
        std::iter::once(&self.root).chain(self.relations.iter().map(|r| &r.relation_location))
    }

    fn is_established(&self, location: &EntityLocation) -> bool {
        self.locations().any(|l| l == location)
    }

    /// Finish the set.
    pub fn build(self) -> EntityRelationSet<T> {
        EntityRelationSet {
            provider: self.provider,
            root: self.root,
            relations: self.relations,
            _marker: PhantomData,
        }
    }
}
