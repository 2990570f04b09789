//! Resolved attribute metadata and typed attribute references.

use crate::location::EntityLocation;
use std::fmt;
use std::marker::PhantomData;
use std::ops::BitOr;

/// Kind flags of a resolved attribute.
///
/// The base kinds are mutually exclusive; the composites are unions used to
/// ask questions such as "is this part of a key" or "does this live on the
/// root table".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityAttributeTypes(u16);

impl EntityAttributeTypes {
    pub const NONE: Self = Self(0);
    pub const DIRECT_ATTRIBUTE: Self = Self(1);
    pub const DIRECT_PRIMARY_KEY: Self = Self(1 << 1);
    pub const DIRECT_AUTO_NUMBER_KEY: Self = Self(1 << 2);
    pub const RELATED_ATTRIBUTE: Self = Self(1 << 3);
    pub const RELATED_PRIMARY_KEY: Self = Self(1 << 4);
    pub const RELATED_AUTO_NUMBER_KEY: Self = Self(1 << 5);
    pub const RELATION: Self = Self(1 << 6);

    /// Any primary key column, assigned or generated.
    pub const PRIMARY_KEY: Self = Self(
        Self::DIRECT_PRIMARY_KEY.0
            | Self::DIRECT_AUTO_NUMBER_KEY.0
            | Self::RELATED_PRIMARY_KEY.0
            | Self::RELATED_AUTO_NUMBER_KEY.0,
    );
    /// Server-generated columns.
    pub const IDENTITY_COLUMN: Self =
        Self(Self::DIRECT_AUTO_NUMBER_KEY.0 | Self::RELATED_AUTO_NUMBER_KEY.0);
    /// Columns on the root table.
    pub const DIRECT: Self = Self(
        Self::DIRECT_ATTRIBUTE.0 | Self::DIRECT_PRIMARY_KEY.0 | Self::DIRECT_AUTO_NUMBER_KEY.0,
    );
    /// Columns reached through a join.
    pub const RELATED: Self = Self(
        Self::RELATED_ATTRIBUTE.0 | Self::RELATED_PRIMARY_KEY.0 | Self::RELATED_AUTO_NUMBER_KEY.0,
    );

    /// Whether every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for EntityAttributeTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for EntityAttributeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(EntityAttributeTypes, &str); 7] = [
            (EntityAttributeTypes::DIRECT_ATTRIBUTE, "DirectAttribute"),
            (EntityAttributeTypes::DIRECT_PRIMARY_KEY, "DirectPrimaryKey"),
            (EntityAttributeTypes::DIRECT_AUTO_NUMBER_KEY, "DirectAutoNumberKey"),
            (EntityAttributeTypes::RELATED_ATTRIBUTE, "RelatedAttribute"),
            (EntityAttributeTypes::RELATED_PRIMARY_KEY, "RelatedPrimaryKey"),
            (EntityAttributeTypes::RELATED_AUTO_NUMBER_KEY, "RelatedAutoNumberKey"),
            (EntityAttributeTypes::RELATION, "Relation"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// One resolved attribute of an entity definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAttributeDefinition {
    /// Locations from the root entity to the table holding the value
    pub path: Vec<EntityLocation>,
    /// Relation properties walked from the root, empty for root and flat attributes
    pub relation_path: Vec<&'static str>,
    pub property_name: &'static str,
    pub physical_name: &'static str,
    /// Column alias used in projections, set when it differs from the physical name
    pub alias: Option<String>,
    pub attribute_types: EntityAttributeTypes,
    /// Discovery order within the definition
    pub ordinal: usize,
    /// Name under which the attribute is referenced and read back,
    /// e.g. `SubEntity.UniqueName`
    pub reference_name: String,
}

impl EntityAttributeDefinition {
    /// The location the value is read from.
    pub fn resolved_location(&self) -> &EntityLocation {
        // Paths always start with the root location.
        &self.path[self.path.len() - 1]
    }

    /// The root entity's location.
    pub fn entity_location(&self) -> &EntityLocation {
        &self.path[0]
    }

    pub fn is_primary_key(&self) -> bool {
        self.attribute_types.intersects(EntityAttributeTypes::PRIMARY_KEY)
    }

    pub fn is_identity_column(&self) -> bool {
        self.attribute_types
            .intersects(EntityAttributeTypes::IDENTITY_COLUMN)
    }

    pub fn is_direct(&self) -> bool {
        self.attribute_types.intersects(EntityAttributeTypes::DIRECT)
    }

    pub fn is_related(&self) -> bool {
        self.attribute_types.intersects(EntityAttributeTypes::RELATED)
    }

    pub fn is_relation(&self) -> bool {
        self.attribute_types.contains(EntityAttributeTypes::RELATION)
    }

    /// Whether the attribute carries a column value.
    pub fn is_scalar(&self) -> bool {
        !self.is_relation()
    }
}

/// A typed reference to an attribute of `E`.
///
/// References are plain reference names checked against `E`'s resolved
/// definition when used; a name that does not resolve is a lookup error
/// naming the property and entity.
pub struct Attr<E> {
    reference: &'static str,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Attr<E> {
    /// Reference an attribute by reference name (`"Prop"` or `"Relation.Prop"`).
    pub const fn new(reference: &'static str) -> Self {
        Self {
            reference,
            _marker: PhantomData,
        }
    }

    /// The reference name.
    pub const fn reference(&self) -> &'static str {
        self.reference
    }
}

impl<E> Clone for Attr<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Attr<E> {}

impl<E> fmt::Debug for Attr<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attr<{}>({})", std::any::type_name::<E>(), self.reference)
    }
}
