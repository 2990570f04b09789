//! Item selections: what to read, from where, under which conditions.

use crate::filter::{FilterKind, ValueFilter};
use crate::relation::{EntityRelationSet, EntityRelationSetBuilder};
use crate::set_ops::SetOpType;
use sqlentity_core::{
    Attr, Entity, EntityAttributeDefinition, EntityDefinition, EntityDefinitionProvider,
    EntityLocation, EntityValues, Error, LookupErrorKind, Result, Value,
};
use std::fmt;
use std::sync::Arc;

/// A selection of `T` items.
///
/// Builder methods consume and return the selection. Methods that take an
/// attribute reference resolve it immediately and fail with a lookup error
/// when it does not exist on `T`.
///
/// # Example
///
/// ```ignore
/// let selection = ItemSelection::<DataRow>::new()?
///     .where_equal(DataRow::VALUE_COLUMN, 2)?
///     .where_like(DataRow::NULLABLE_COLUMN, "%Nullable%")?
///     .limit(10);
/// ```
pub struct ItemSelection<T> {
    definition: Arc<EntityDefinition>,
    relations: EntityRelationSet<T>,
    filters: Vec<ValueFilter>,
    projection: Vec<Arc<EntityAttributeDefinition>>,
    limit: Option<usize>,
    source: Option<Box<ItemSelection<T>>>,
    linked: Option<(SetOpType, Box<ItemSelection<T>>)>,
}

impl<T: Entity> ItemSelection<T> {
    /// Select `T` with the joins implied by its relation properties.
    pub fn new() -> Result<Self> {
        Self::with_provider(EntityDefinitionProvider::shared())
    }

    /// Select `T` as resolved by `provider`, so its configuration (default
    /// schema, depth limit) applies to `T` and to every joined entity.
    pub fn with_provider(provider: Arc<EntityDefinitionProvider>) -> Result<Self> {
        let definition = provider.resolve::<T>()?;
        let relations = EntityRelationSet::with_definition(provider, &definition);
        Ok(Self::from_parts(definition, relations))
    }

    /// Select `T` with an explicit relation set.
    pub fn with_relations(relations: EntityRelationSet<T>) -> Result<Self> {
        let definition = relations.provider().resolve::<T>()?;
        Ok(Self::from_parts(definition, relations))
    }

    /// Select `T` from the rows `inner` returns instead of from its table.
    pub fn from_selection(inner: ItemSelection<T>) -> Result<Self> {
        let mut selection = Self::with_provider(Arc::clone(inner.relations.provider()))?;
        selection.source = Some(Box::new(inner));
        Ok(selection)
    }

    fn from_parts(definition: Arc<EntityDefinition>, relations: EntityRelationSet<T>) -> Self {
        Self {
            definition,
            relations,
            filters: Vec::new(),
            projection: Vec::new(),
            limit: None,
            source: None,
            linked: None,
        }
    }

    /// Project only these attributes, in this order.
    pub fn select(mut self, attributes: &[Attr<T>]) -> Result<Self> {
        let mut projection = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            projection.push(self.column(*attribute, "attributes")?);
        }
        self.projection = projection;
        Ok(self)
    }

    pub fn where_equal(self, attribute: Attr<T>, value: impl Into<Value>) -> Result<Self> {
        self.filter(attribute, FilterKind::Equal(value.into()))
    }

    pub fn where_not_equal(self, attribute: Attr<T>, value: impl Into<Value>) -> Result<Self> {
        self.filter(attribute, FilterKind::NotEqual(value.into()))
    }

    pub fn where_null(self, attribute: Attr<T>) -> Result<Self> {
        self.filter(attribute, FilterKind::IsNull)
    }

    pub fn where_not_null(self, attribute: Attr<T>) -> Result<Self> {
        self.filter(attribute, FilterKind::IsNotNull)
    }

    pub fn where_like(self, attribute: Attr<T>, pattern: impl Into<Value>) -> Result<Self> {
        self.filter(attribute, FilterKind::Like(pattern.into()))
    }

    pub fn where_not_like(self, attribute: Attr<T>, pattern: impl Into<Value>) -> Result<Self> {
        self.filter(attribute, FilterKind::NotLike(pattern.into()))
    }

    /// Match any of `values`; an empty list is an argument error.
    pub fn where_in<V: Into<Value>>(
        self,
        attribute: Attr<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let values = non_empty(values)?;
        self.filter(attribute, FilterKind::In(values))
    }

    /// Match none of `values`; an empty list is an argument error.
    pub fn where_not_in<V: Into<Value>>(
        self,
        attribute: Attr<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let values = non_empty(values)?;
        self.filter(attribute, FilterKind::NotIn(values))
    }

    pub fn where_between(
        self,
        attribute: Attr<T>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Result<Self> {
        self.filter(attribute, FilterKind::Between(low.into(), high.into()))
    }

    /// Match an optionally open range. Bounds are inclusive.
    pub fn where_range<V: Into<Value>>(
        self,
        attribute: Attr<T>,
        min: Option<V>,
        max: Option<V>,
    ) -> Result<Self> {
        let kind = match (min, max) {
            (Some(min), Some(max)) => FilterKind::Between(min.into(), max.into()),
            (Some(min), None) => FilterKind::AtLeast(min.into()),
            (None, Some(max)) => FilterKind::AtMost(max.into()),
            (None, None) => {
                return Err(Error::argument("range", "a range needs at least one bound"));
            }
        };
        self.filter(attribute, kind)
    }

    /// Match the value `example` holds for `attribute`.
    ///
    /// A NULL example value renders as `IS NULL`.
    pub fn matching(self, example: &T, attribute: Attr<T>) -> Result<Self>
    where
        T: EntityValues,
    {
        let value = example.value(attribute.reference()).ok_or_else(|| {
            Error::lookup(
                LookupErrorKind::Accessor,
                attribute.reference(),
                self.definition.entity_name(),
            )
        })?;
        self.filter(attribute, FilterKind::Equal(value))
    }

    pub fn inner_join<R: Entity>(self, source: Attr<T>, relation: Attr<R>) -> Result<Self> {
        self.map_relations(|b| b.inner_join(source, relation))
    }

    pub fn left_join<R: Entity>(self, source: Attr<T>, relation: Attr<R>) -> Result<Self> {
        self.map_relations(|b| b.left_join(source, relation))
    }

    pub fn inner_join_as<R: Entity>(
        self,
        source: Attr<T>,
        relation: Attr<R>,
        alias: &str,
    ) -> Result<Self> {
        self.map_relations(|b| b.inner_join_as(source, relation, alias))
    }

    pub fn left_join_as<R: Entity>(
        self,
        source: Attr<T>,
        relation: Attr<R>,
        alias: &str,
    ) -> Result<Self> {
        self.map_relations(|b| b.left_join_as(source, relation, alias))
    }

    pub fn inner_join_from<S: Entity, R: Entity>(
        self,
        source: Attr<S>,
        source_alias: Option<&str>,
        relation: Attr<R>,
        relation_alias: Option<&str>,
    ) -> Result<Self> {
        self.map_relations(|b| b.inner_join_from(source, source_alias, relation, relation_alias))
    }

    pub fn left_join_from<S: Entity, R: Entity>(
        self,
        source: Attr<S>,
        source_alias: Option<&str>,
        relation: Attr<R>,
        relation_alias: Option<&str>,
    ) -> Result<Self> {
        self.map_relations(|b| b.left_join_from(source, source_alias, relation, relation_alias))
    }

    fn map_relations(
        mut self,
        f: impl FnOnce(EntityRelationSetBuilder<T>) -> Result<EntityRelationSetBuilder<T>>,
    ) -> Result<Self> {
        self.relations = f(self.relations.into_builder())?.build();
        Ok(self)
    }

    fn filter(mut self, attribute: Attr<T>, kind: FilterKind) -> Result<Self> {
        let attribute = self.column(attribute, "attribute")?;
        self.filters.push(ValueFilter::new(attribute, kind));
        Ok(self)
    }

    fn column(
        &self,
        attribute: Attr<T>,
        argument: &'static str,
    ) -> Result<Arc<EntityAttributeDefinition>> {
        let resolved = self.definition.attribute(attribute.reference())?;
        if resolved.is_relation() {
            return Err(Error::argument(
                argument,
                format!("'{}' is a relation, not a column", resolved.reference_name),
            ));
        }
        Ok(Arc::clone(resolved))
    }
}

impl<T> ItemSelection<T> {
    /// Return at most `limit` rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn union(self, other: ItemSelection<T>) -> Self {
        self.link(SetOpType::Union, other)
    }

    pub fn union_all(self, other: ItemSelection<T>) -> Self {
        self.link(SetOpType::UnionAll, other)
    }

    pub fn intersect(self, other: ItemSelection<T>) -> Self {
        self.link(SetOpType::Intersect, other)
    }

    pub fn except(self, other: ItemSelection<T>) -> Self {
        self.link(SetOpType::Except, other)
    }

    /// Append `other` to the end of the linked chain.
    fn link(mut self, op: SetOpType, other: ItemSelection<T>) -> Self {
        self.linked = Some(match self.linked.take() {
            None => (op, Box::new(other)),
            Some((existing, next)) => (existing, Box::new(next.link(op, other))),
        });
        self
    }

    pub fn definition(&self) -> &Arc<EntityDefinition> {
        &self.definition
    }

    pub fn relations(&self) -> &EntityRelationSet<T> {
        &self.relations
    }

    pub fn filters(&self) -> &[ValueFilter] {
        &self.filters
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn source(&self) -> Option<&ItemSelection<T>> {
        self.source.as_deref()
    }

    pub fn linked(&self) -> Option<(SetOpType, &ItemSelection<T>)> {
        self.linked.as_ref().map(|(op, next)| (*op, next.as_ref()))
    }

    /// Root table of the selection.
    pub fn root(&self) -> &EntityLocation {
        self.relations.root()
    }

    /// The attributes a SELECT returns.
    ///
    /// Defaults to every scalar attribute whose location is part of the
    /// selection, in ordinal order.
    pub fn projected_attributes(&self) -> Vec<Arc<EntityAttributeDefinition>> {
        if !self.projection.is_empty() {
            return self.projection.clone();
        }
        self.definition
            .scalar_attributes()
            .filter(|a| self.relations.contains_location(a.resolved_location()))
            .cloned()
            .collect()
    }
}

impl<T> Clone for ItemSelection<T> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            relations: self.relations.clone(),
            filters: self.filters.clone(),
            projection: self.projection.clone(),
            limit: self.limit,
            source: self.source.clone(),
            linked: self.linked.clone(),
        }
    }
}

impl<T> fmt::Debug for ItemSelection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemSelection")
            .field("entity", &self.definition.entity_name())
            .field("relations", &self.relations.len())
            .field("filters", &self.filters)
            .field("limit", &self.limit)
            .field("derived", &self.source.is_some())
            .field("linked", &self.linked.as_ref().map(|(op, _)| *op))
            .finish()
    }
}

fn non_empty<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Result<Vec<Value>> {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(Error::argument("values", "an IN list needs at least one value"));
    }
    Ok(values)
}
