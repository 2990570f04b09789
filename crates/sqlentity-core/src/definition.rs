//! Entity definition resolution.
//!
//! [`EntityDefinitionProvider`] walks an entity's declaration, recursing into
//! relation properties, and produces a flattened [`EntityDefinition`]:
//! every scalar reachable from the root with its location path, key
//! classification, physical and reference names, plus the join edges that
//! connect nested entities to their owners.

use crate::attribute::{Attr, EntityAttributeDefinition, EntityAttributeTypes};
use crate::config::ResolverConfig;
use crate::entity::{
    AttributeInfo, AttributeSource, Entity, EntityDescriptor, JoinType, RelationInfo,
    TableTypeInfo,
};
use crate::error::{DeclarationErrorKind, Error, LookupErrorKind, Result};
use crate::location::EntityLocation;
use crate::relation::EntityRelation;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// The resolved attribute catalog of one entity type.
#[derive(Debug)]
pub struct EntityDefinition {
    descriptor: &'static EntityDescriptor,
    location: EntityLocation,
    attributes: Vec<Arc<EntityAttributeDefinition>>,
    references: HashMap<String, usize>,
    relations: Vec<EntityRelation>,
}

impl EntityDefinition {
    pub fn entity_name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn entity_container(&self) -> &str {
        &self.location.container
    }

    /// The root table's location.
    pub fn location(&self) -> &EntityLocation {
        &self.location
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    /// Every resolved attribute, relations included, in ordinal order.
    pub fn all_attributes(&self) -> &[Arc<EntityAttributeDefinition>] {
        &self.attributes
    }

    /// Attributes carrying a column value.
    pub fn scalar_attributes(&self) -> impl Iterator<Item = &Arc<EntityAttributeDefinition>> {
        self.attributes.iter().filter(|a| a.is_scalar())
    }

    /// Columns of the root table.
    pub fn direct_attributes(&self) -> impl Iterator<Item = &Arc<EntityAttributeDefinition>> {
        self.attributes.iter().filter(|a| a.is_direct())
    }

    /// Primary key columns of the root table.
    pub fn primary_key_attributes(&self) -> impl Iterator<Item = &Arc<EntityAttributeDefinition>> {
        self.direct_attributes().filter(|a| a.is_primary_key())
    }

    /// The server-generated primary key, if the entity has one.
    pub fn auto_number_primary_key(&self) -> Option<&Arc<EntityAttributeDefinition>> {
        self.attributes.iter().find(|a| {
            a.attribute_types
                .contains(EntityAttributeTypes::DIRECT_AUTO_NUMBER_KEY)
        })
    }

    /// Root table columns a caller may write.
    pub fn updateable_attributes(&self) -> impl Iterator<Item = &Arc<EntityAttributeDefinition>> {
        self.direct_attributes().filter(|a| !a.is_identity_column())
    }

    /// Nested entity properties.
    pub fn relation_attributes(&self) -> impl Iterator<Item = &Arc<EntityAttributeDefinition>> {
        self.attributes.iter().filter(|a| a.is_relation())
    }

    /// Join edges implied by relation properties, in dependency order.
    pub fn default_relations(&self) -> &[EntityRelation] {
        &self.relations
    }

    pub fn table_type(&self) -> Option<TableTypeInfo> {
        self.descriptor.table_type
    }

    /// Find an attribute by reference name.
    pub fn find(&self, reference: &str) -> Option<&Arc<EntityAttributeDefinition>> {
        self.references
            .get(reference)
            .map(|&index| &self.attributes[index])
    }

    /// Find an attribute by reference name, failing with a lookup error.
    pub fn attribute(&self, reference: &str) -> Result<&Arc<EntityAttributeDefinition>> {
        self.find(reference).ok_or_else(|| {
            Error::lookup(LookupErrorKind::Attribute, reference, self.entity_name())
        })
    }

    /// Find the direct column with the given physical name, ignoring case.
    pub fn direct_column(&self, physical_name: &str) -> Option<&Arc<EntityAttributeDefinition>> {
        self.direct_attributes()
            .find(|a| a.physical_name.eq_ignore_ascii_case(physical_name))
    }
}

/// Resolves and caches entity definitions per type.
///
/// Resolution happens outside the cache lock; when two threads race on the
/// same type the first stored definition wins and both callers receive it.
/// Failures are returned to the caller and never cached.
#[derive(Debug)]
pub struct EntityDefinitionProvider {
    config: ResolverConfig,
    cache: RwLock<HashMap<TypeId, Arc<EntityDefinition>>>,
}

impl Default for EntityDefinitionProvider {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl EntityDefinitionProvider {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide provider using the default configuration.
    pub fn global() -> &'static EntityDefinitionProvider {
        Self::global_handle()
    }

    /// A shared handle to the process-wide provider.
    pub fn shared() -> Arc<EntityDefinitionProvider> {
        Arc::clone(Self::global_handle())
    }

    fn global_handle() -> &'static Arc<EntityDefinitionProvider> {
        static PROVIDER: OnceLock<Arc<EntityDefinitionProvider>> = OnceLock::new();
        PROVIDER.get_or_init(|| Arc::new(EntityDefinitionProvider::default()))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the definition of `T`, computing it on first use.
    pub fn resolve<T: Entity>(&self) -> Result<Arc<EntityDefinition>> {
        let key = TypeId::of::<T>();
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(definition) = cache.get(&key) {
                return Ok(Arc::clone(definition));
            }
        }

        let definition = Arc::new(self.resolve_descriptor(T::descriptor())?);
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(cache.entry(key).or_insert(definition)))
    }

    /// Resolve a descriptor without consulting or filling the cache.
    #[tracing::instrument(level = "trace", skip(self, descriptor), fields(entity = descriptor.name))]
    pub fn resolve_descriptor(
        &self,
        descriptor: &'static EntityDescriptor,
    ) -> Result<EntityDefinition> {
        let location = self.location_of(descriptor, None);
        let mut walker = Walker {
            config: &self.config,
            root: descriptor,
            discovered: Vec::new(),
            edges: Vec::new(),
            established: vec![location.clone()],
        };
        walker.walk(
            descriptor,
            &Level {
                path: vec![location.clone()],
                relation_path: Vec::new(),
                prefix: String::new(),
                ancestors: vec![descriptor],
            },
        )?;

        let Walker {
            discovered, edges, ..
        } = walker;
        let (attributes, references) = merge(discovered);

        let mut relations = Vec::with_capacity(edges.len());
        for edge in edges {
            let source = lookup(&attributes, &references, &edge.source, descriptor.name)?;
            let relation = lookup(&attributes, &references, &edge.relation, descriptor.name)?;
            relations.push(EntityRelation::new(edge.join_type, source, relation));
        }

        tracing::debug!(
            entity = descriptor.name,
            attributes = attributes.len(),
            relations = relations.len(),
            "Resolved entity definition"
        );

        Ok(EntityDefinition {
            descriptor,
            location,
            attributes,
            references,
            relations,
        })
    }

    /// Number of cached definitions.
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn location_of(
        &self,
        descriptor: &'static EntityDescriptor,
        alias: Option<&str>,
    ) -> EntityLocation {
        location_of(&self.config, descriptor, alias)
    }
}

/// Resolve `T` through the process-wide provider.
pub fn definition_of<T: Entity>() -> Result<Arc<EntityDefinition>> {
    EntityDefinitionProvider::global().resolve::<T>()
}

impl<E: Entity> Attr<E> {
    /// Resolve this reference against `E`'s definition.
    pub fn resolve(&self) -> Result<Arc<EntityAttributeDefinition>> {
        self.resolve_with(EntityDefinitionProvider::global())
    }

    /// Resolve this reference against `E`'s definition from `provider`.
    pub fn resolve_with(
        &self,
        provider: &EntityDefinitionProvider,
    ) -> Result<Arc<EntityAttributeDefinition>> {
        let definition = provider.resolve::<E>()?;
        self.resolve_in(&definition)
    }

    /// Resolve this reference against an already resolved definition of `E`.
    pub fn resolve_in(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Arc<EntityAttributeDefinition>> {
        if !std::ptr::eq(definition.descriptor(), E::descriptor()) {
            return Err(Error::argument(
                "definition",
                format!(
                    "'{}' does not belong to the definition of '{}'",
                    self.reference(),
                    definition.entity_name()
                ),
            ));
        }
        definition.attribute(self.reference()).cloned()
    }
}

fn location_of(
    config: &ResolverConfig,
    descriptor: &'static EntityDescriptor,
    alias: Option<&str>,
) -> EntityLocation {
    EntityLocation::new(
        descriptor.name,
        config.container_or_default(descriptor.container),
        descriptor.table_name(),
    )
    .with_alias(alias)
}

fn lookup(
    attributes: &[Arc<EntityAttributeDefinition>],
    references: &HashMap<String, usize>,
    reference: &str,
    entity: &str,
) -> Result<Arc<EntityAttributeDefinition>> {
    references
        .get(reference)
        .map(|&index| Arc::clone(&attributes[index]))
        .ok_or_else(|| Error::lookup(LookupErrorKind::Attribute, reference, entity))
}

struct Level {
    path: Vec<EntityLocation>,
    relation_path: Vec<&'static str>,
    prefix: String,
    ancestors: Vec<&'static EntityDescriptor>,
}

impl Level {
    fn is_root(&self) -> bool {
        self.relation_path.is_empty()
    }
}

struct PendingEdge {
    join_type: JoinType,
    source: String,
    relation: String,
}

struct Discovered {
    attribute: EntityAttributeDefinition,
    /// Scalar declared flat on its owner but read from a joined table
    flat: bool,
}

struct Walker<'a> {
    config: &'a ResolverConfig,
    root: &'static EntityDescriptor,
    discovered: Vec<Discovered>,
    edges: Vec<PendingEdge>,
    /// Locations joined so far, root first
    established: Vec<EntityLocation>,
}

impl Walker<'_> {
    fn walk(&mut self, descriptor: &'static EntityDescriptor, level: &Level) -> Result<()> {
        validate_keys(descriptor)?;

        for info in descriptor.attributes {
            match info.source {
                AttributeSource::Direct => self.push_direct(descriptor, info, level),
                AttributeSource::Related { entity, alias } => {
                    self.push_related(info, entity(), alias, level)?;
                }
                AttributeSource::Relation(relation) => {
                    self.push_relation(descriptor, info, &relation, level)?;
                }
            }
        }
        Ok(())
    }

    fn push_direct(
        &mut self,
        descriptor: &'static EntityDescriptor,
        info: &'static AttributeInfo,
        level: &Level,
    ) {
        let kind = match (
            level.is_root(),
            descriptor.is_key(info.property),
            descriptor.auto_increment,
        ) {
            (true, true, true) => EntityAttributeTypes::DIRECT_AUTO_NUMBER_KEY,
            (true, true, false) => EntityAttributeTypes::DIRECT_PRIMARY_KEY,
            (true, false, _) => EntityAttributeTypes::DIRECT_ATTRIBUTE,
            (false, true, true) => EntityAttributeTypes::RELATED_AUTO_NUMBER_KEY,
            (false, true, false) => EntityAttributeTypes::RELATED_PRIMARY_KEY,
            (false, false, _) => EntityAttributeTypes::RELATED_ATTRIBUTE,
        };
        let attribute = scalar(
            level.path.clone(),
            level,
            info.property,
            info.column_name(),
            kind,
        );
        self.discovered.push(Discovered {
            attribute,
            flat: false,
        });
    }

    fn push_related(
        &mut self,
        info: &'static AttributeInfo,
        related: &'static EntityDescriptor,
        alias: Option<&'static str>,
        level: &Level,
    ) -> Result<()> {
        let column = related.direct_column(info.column_name()).ok_or_else(|| {
            Error::declaration(
                DeclarationErrorKind::UnknownColumn,
                self.root.name,
                format!(
                    "'{}' refers to column '{}' which '{}' does not declare",
                    info.property,
                    info.column_name(),
                    related.name
                ),
            )
        })?;
        validate_keys(related)?;

        let kind = match (related.is_key(column.property), related.auto_increment) {
            (true, true) => EntityAttributeTypes::RELATED_AUTO_NUMBER_KEY,
            (true, false) => EntityAttributeTypes::RELATED_PRIMARY_KEY,
            (false, _) => EntityAttributeTypes::RELATED_ATTRIBUTE,
        };
        let mut path = level.path.clone();
        path.push(location_of(self.config, related, alias));

        let attribute = scalar(path, level, info.property, column.column_name(), kind);
        self.discovered.push(Discovered {
            attribute,
            flat: true,
        });
        Ok(())
    }

    fn push_relation(
        &mut self,
        descriptor: &'static EntityDescriptor,
        info: &'static AttributeInfo,
        relation: &RelationInfo,
        level: &Level,
    ) -> Result<()> {
        if relation.source_key.is_empty() || relation.relation_key.is_empty() {
            return Err(Error::declaration(
                DeclarationErrorKind::MissingRelation,
                descriptor.name,
                format!("relation '{}' declares no join keys", info.property),
            ));
        }

        let nested = (relation.entity)();
        if level.ancestors.iter().any(|a| std::ptr::eq(*a, nested)) {
            return Err(Error::declaration(
                DeclarationErrorKind::CyclicRelation,
                self.root.name,
                format!(
                    "relation '{}{}' refers back to '{}'",
                    level.prefix, info.property, nested.name
                ),
            ));
        }
        if level.relation_path.len() + 1 > self.config.max_relation_depth {
            return Err(Error::declaration(
                DeclarationErrorKind::RelationDepth,
                self.root.name,
                format!(
                    "relation '{}{}' is nested deeper than {} levels",
                    level.prefix, info.property, self.config.max_relation_depth
                ),
            ));
        }

        let reference_name = format!("{}{}", level.prefix, info.property);
        let location = location_of(self.config, nested, relation.alias);
        if let Some(existing) = self.established.iter().find(|l| l.collides_with(&location)) {
            return Err(Error::declaration(
                DeclarationErrorKind::DuplicateLocation,
                self.root.name,
                format!(
                    "relation '{}' joins {} which is already joined as {}; give it an alias",
                    reference_name, location, existing
                ),
            ));
        }
        self.established.push(location.clone());
        let mut path = level.path.clone();
        path.push(location);

        self.discovered.push(Discovered {
            attribute: EntityAttributeDefinition {
                path: path.clone(),
                relation_path: level.relation_path.clone(),
                property_name: info.property,
                physical_name: info.property,
                alias: None,
                attribute_types: EntityAttributeTypes::RELATION,
                ordinal: 0,
                reference_name: reference_name.clone(),
            },
            flat: false,
        });
        self.edges.push(PendingEdge {
            join_type: relation.join_type,
            source: format!("{}{}", level.prefix, relation.source_key),
            relation: format!("{}.{}", reference_name, relation.relation_key),
        });

        let mut relation_path = level.relation_path.clone();
        relation_path.push(info.property);
        let mut ancestors = level.ancestors.clone();
        ancestors.push(nested);
        self.walk(
            nested,
            &Level {
                path,
                relation_path,
                prefix: format!("{}.", reference_name),
                ancestors,
            },
        )
    }
}

fn scalar(
    path: Vec<EntityLocation>,
    level: &Level,
    property: &'static str,
    physical_name: &'static str,
    kind: EntityAttributeTypes,
) -> EntityAttributeDefinition {
    let reference_name = format!("{}{}", level.prefix, property);
    let alias = (reference_name != physical_name).then(|| reference_name.clone());
    EntityAttributeDefinition {
        path,
        relation_path: level.relation_path.clone(),
        property_name: property,
        physical_name,
        alias,
        attribute_types: kind,
        ordinal: 0,
        reference_name,
    }
}

fn validate_keys(descriptor: &'static EntityDescriptor) -> Result<()> {
    for key in descriptor.primary_key {
        match descriptor.attribute(key) {
            Some(info) if info.is_direct() => {}
            _ => {
                return Err(Error::declaration(
                    DeclarationErrorKind::MissingPrimaryKey,
                    descriptor.name,
                    format!("primary key '{}' is not a declared column", key),
                ));
            }
        }
    }
    if descriptor.auto_increment && descriptor.primary_key.len() != 1 {
        return Err(Error::declaration(
            DeclarationErrorKind::InvalidAutoNumber,
            descriptor.name,
            format!(
                "auto-increment requires exactly one primary key column, found {}",
                descriptor.primary_key.len()
            ),
        ));
    }
    Ok(())
}

/// Collapse scalars read from the same column of the same location.
///
/// Only a flat attribute is merged into its counterpart; the nested
/// (raised) attribute wins, keeps the earlier position, and the flat
/// reference name keeps resolving to it.
fn merge(
    discovered: Vec<Discovered>,
) -> (Vec<Arc<EntityAttributeDefinition>>, HashMap<String, usize>) {
    let mut kept: Vec<Discovered> = Vec::with_capacity(discovered.len());
    let mut aliases: Vec<(String, usize)> = Vec::new();
    let mut by_column: HashMap<(EntityLocation, &'static str), usize> = HashMap::new();

    for item in discovered {
        if item.attribute.is_relation() {
            kept.push(item);
            continue;
        }
        let key = (
            item.attribute.resolved_location().clone(),
            item.attribute.physical_name,
        );
        match by_column.get(&key) {
            Some(&index) if kept[index].flat || item.flat => {
                if kept[index].flat && !item.flat {
                    let replaced = std::mem::replace(&mut kept[index], item);
                    aliases.push((replaced.attribute.reference_name, index));
                } else {
                    aliases.push((item.attribute.reference_name, index));
                }
            }
            Some(_) => kept.push(item),
            None => {
                by_column.insert(key, kept.len());
                kept.push(item);
            }
        }
    }

    let mut references = HashMap::with_capacity(kept.len() + aliases.len());
    let attributes = kept
        .into_iter()
        .enumerate()
        .map(|(ordinal, item)| {
            let mut attribute = item.attribute;
            attribute.ordinal = ordinal;
            references.insert(attribute.reference_name.clone(), ordinal);
            Arc::new(attribute)
        })
        .collect();
    for (reference, index) in aliases {
        references.entry(reference).or_insert(index);
    }
    (attributes, references)
}
