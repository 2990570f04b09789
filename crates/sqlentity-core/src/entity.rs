//! Static entity declarations.
//!
//! Every entity type describes its table, keys and attributes through a
//! `'static` [`EntityDescriptor`]. The resolver walks these descriptors to
//! build the attribute catalog; nothing else is consulted for schema truth.

use crate::value::Value;

/// A function returning the descriptor of a related entity type.
///
/// Descriptors refer to each other through these pointers so that entity
/// graphs can be declared in any order, including graphs that (incorrectly)
/// refer back to themselves, which the resolver rejects.
pub type DescriptorFn = fn() -> &'static EntityDescriptor;

/// Trait implemented by every type that maps onto a table.
///
/// # Example
///
/// ```ignore
/// impl Entity for FakeSubEntityRow {
///     fn descriptor() -> &'static EntityDescriptor {
///         static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
///             "FakeSubEntity",
///             &[
///                 AttributeInfo::column("FakeSubEntityId"),
///                 AttributeInfo::column("UniqueName"),
///             ],
///         )
///         .primary_key(&["FakeSubEntityId"])
///         .auto_increment();
///         &DESCRIPTOR
///     }
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// The declaration of this entity type.
    fn descriptor() -> &'static EntityDescriptor;
}

/// Read access to an entity's current property values.
///
/// Used wherever a statement takes its values from an item: update SET
/// clauses, structured payload rows and example-based filters.
pub trait EntityValues: Entity {
    /// Current value of the named property, `None` if the type has no such
    /// property. A property holding SQL NULL returns `Some(Value::Null)`.
    fn value(&self, property: &str) -> Option<Value>;
}

/// SQL join kind of a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// Schema-qualified name of a user-defined table type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableTypeInfo {
    pub container: &'static str,
    pub name: &'static str,
}

/// The declaration of one entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Logical entity name. Types describing the same table share it.
    pub name: &'static str,
    /// Schema name, empty for the configured default
    pub container: &'static str,
    /// Table name, empty when it equals `name`
    pub table: &'static str,
    /// Properties forming the primary key, in key order
    pub primary_key: &'static [&'static str],
    /// Whether the (single) primary key is generated by the server
    pub auto_increment: bool,
    /// Declared attributes in declaration order
    pub attributes: &'static [AttributeInfo],
    /// Table type used when this type is sent as a structured parameter
    pub table_type: Option<TableTypeInfo>,
}

impl EntityDescriptor {
    /// Create a descriptor for an entity stored in a table of the same name.
    pub const fn new(name: &'static str, attributes: &'static [AttributeInfo]) -> Self {
        Self {
            name,
            container: "",
            table: "",
            primary_key: &[],
            auto_increment: false,
            attributes,
            table_type: None,
        }
    }

    /// Set the schema and table name.
    pub const fn table(mut self, container: &'static str, name: &'static str) -> Self {
        self.container = container;
        self.table = name;
        self
    }

    /// Set the primary key properties.
    pub const fn primary_key(mut self, properties: &'static [&'static str]) -> Self {
        self.primary_key = properties;
        self
    }

    /// Mark the primary key as server generated.
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Declare the table type used for structured commands.
    pub const fn table_type(mut self, container: &'static str, name: &'static str) -> Self {
        self.table_type = Some(TableTypeInfo { container, name });
        self
    }

    /// The physical table name.
    pub const fn table_name(&self) -> &'static str {
        if self.table.is_empty() {
            self.name
        } else {
            self.table
        }
    }

    /// Find a declared attribute by property name.
    pub fn attribute(&self, property: &str) -> Option<&'static AttributeInfo> {
        self.attributes.iter().find(|a| a.property == property)
    }

    /// Find a direct column by physical name, ignoring case.
    pub fn direct_column(&self, column: &str) -> Option<&'static AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| a.is_direct() && a.column_name().eq_ignore_ascii_case(column))
    }

    /// Whether the property is part of the primary key.
    pub fn is_key(&self, property: &str) -> bool {
        self.primary_key.contains(&property)
    }
}

/// Where a declared attribute's value lives.
#[derive(Debug, Clone, Copy)]
pub enum AttributeSource {
    /// A column on the entity's own table
    Direct,
    /// A flat scalar that lives on a joined entity's table
    Related {
        entity: DescriptorFn,
        alias: Option<&'static str>,
    },
    /// A nested entity, resolved recursively
    Relation(RelationInfo),
}

/// Join declaration of a relation property.
#[derive(Debug, Clone, Copy)]
pub struct RelationInfo {
    pub entity: DescriptorFn,
    /// Alias of the joined table, needed when one table is joined twice
    pub alias: Option<&'static str>,
    pub join_type: JoinType,
    /// Property on the declaring entity
    pub source_key: &'static str,
    /// Property on the related entity
    pub relation_key: &'static str,
}

/// One declared attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeInfo {
    /// Property name on the declaring type
    pub property: &'static str,
    /// Physical column name, empty when it equals `property`
    pub column: &'static str,
    pub source: AttributeSource,
}

impl AttributeInfo {
    /// A column on the entity's own table.
    pub const fn column(property: &'static str) -> Self {
        Self {
            property,
            column: "",
            source: AttributeSource::Direct,
        }
    }

    /// A flat scalar read from a joined entity's table.
    pub const fn related(property: &'static str, entity: DescriptorFn) -> Self {
        Self {
            property,
            column: "",
            source: AttributeSource::Related {
                entity,
                alias: None,
            },
        }
    }

    /// A nested entity joined on `source_key = relation_key`.
    pub const fn relation(
        property: &'static str,
        entity: DescriptorFn,
        source_key: &'static str,
        relation_key: &'static str,
    ) -> Self {
        Self {
            property,
            column: "",
            source: AttributeSource::Relation(RelationInfo {
                entity,
                alias: None,
                join_type: JoinType::Inner,
                source_key,
                relation_key,
            }),
        }
    }

    /// Set the physical column name.
    pub const fn named(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    /// Set the alias of the joined table this attribute reads from.
    ///
    /// Has no effect on direct columns.
    pub const fn aliased(mut self, alias: &'static str) -> Self {
        match self.source {
            AttributeSource::Direct => {}
            AttributeSource::Related { entity, .. } => {
                self.source = AttributeSource::Related {
                    entity,
                    alias: Some(alias),
                };
            }
            AttributeSource::Relation(mut relation) => {
                relation.alias = Some(alias);
                self.source = AttributeSource::Relation(relation);
            }
        }
        self
    }

    /// Join the relation with a LEFT JOIN.
    ///
    /// Has no effect on scalar attributes.
    pub const fn left_join(mut self) -> Self {
        if let AttributeSource::Relation(mut relation) = self.source {
            relation.join_type = JoinType::Left;
            self.source = AttributeSource::Relation(relation);
        }
        self
    }

    /// The physical column name.
    pub const fn column_name(&self) -> &'static str {
        if self.column.is_empty() {
            self.property
        } else {
            self.column
        }
    }

    pub const fn is_direct(&self) -> bool {
        matches!(self.source, AttributeSource::Direct)
    }

    pub const fn is_relation(&self) -> bool {
        matches!(self.source, AttributeSource::Relation(_))
    }
}
