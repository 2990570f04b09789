//! Structured (table-valued) parameters.

use serde::{Deserialize, Serialize};
use sqlentity_core::{
    Attr, DeclarationErrorKind, Entity, EntityAttributeDefinition, EntityDefinition,
    EntityDefinitionProvider, EntityValues, Error, LookupErrorKind, NameQualifier, Result,
    TableTypeInfo, Value,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The table-shaped value an execution layer binds as the structured
/// parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPayload {
    /// Unquoted `container.name` of the table type
    pub type_name: String,
    /// Name the command text refers to, e.g. `@FieldValueTableType`
    pub parameter_name: String,
    /// Column names in table type order
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl StructuredPayload {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A batch of `S` items sent as one table-valued parameter.
///
/// `S` must declare a table type; construction fails with a declaration
/// error otherwise.
pub struct StructuredCommand<S> {
    provider: Arc<EntityDefinitionProvider>,
    definition: Arc<EntityDefinition>,
    table_type: TableTypeInfo,
    columns: Vec<Arc<EntityAttributeDefinition>>,
    payload: StructuredPayload,
    _marker: PhantomData<fn() -> S>,
}

impl<S: EntityValues> StructuredCommand<S> {
    pub fn new(items: &[S]) -> Result<Self> {
        Self::with_provider(EntityDefinitionProvider::shared(), items)
    }

    /// Build the batch with `S` and every later target resolved by `provider`.
    pub fn with_provider(provider: Arc<EntityDefinitionProvider>, items: &[S]) -> Result<Self> {
        let definition = provider.resolve::<S>()?;
        let Some(table_type) = definition.table_type() else {
            return Err(Error::declaration(
                DeclarationErrorKind::MissingTableType,
                definition.entity_name(),
                "structured commands need a table type declaration",
            ));
        };

        let columns: Vec<Arc<EntityAttributeDefinition>> =
            definition.direct_attributes().cloned().collect();
        let container = if table_type.container.is_empty() {
            definition.entity_container()
        } else {
            table_type.container
        };

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let row = columns
                .iter()
                .map(|column| {
                    item.value(column.property_name).ok_or_else(|| {
                        Error::lookup(
                            LookupErrorKind::Accessor,
                            column.property_name,
                            definition.entity_name(),
                        )
                    })
                })
                .collect::<Result<Vec<Value>>>()?;
            rows.push(row);
        }

        let payload = StructuredPayload {
            type_name: format!("{}.{}", container, table_type.name),
            parameter_name: format!("@{}", table_type.name),
            columns: columns
                .iter()
                .map(|c| c.physical_name.to_string())
                .collect(),
            rows,
        };

        Ok(Self {
            provider,
            definition,
            table_type,
            columns,
            payload,
            _marker: PhantomData,
        })
    }

    /// Resolve a target entity through this command's provider.
    pub(crate) fn resolve_target<R: Entity>(&self) -> Result<Arc<EntityDefinition>> {
        self.provider.resolve::<R>()
    }

    /// Resolve structure attributes to be used as join keys.
    pub(crate) fn keys(&self, keys: &[Attr<S>]) -> Result<Vec<Arc<EntityAttributeDefinition>>> {
        keys.iter()
            .map(|key| {
                let attribute = self.definition.attribute(key.reference())?;
                if !attribute.is_direct() {
                    return Err(Error::argument(
                        "keys",
                        format!(
                            "'{}' is not a column of the table type",
                            attribute.reference_name
                        ),
                    ));
                }
                Ok(Arc::clone(attribute))
            })
            .collect()
    }
}

impl<S> StructuredCommand<S> {
    pub fn definition(&self) -> &Arc<EntityDefinition> {
        &self.definition
    }

    /// Structure columns in table type order.
    pub fn columns(&self) -> &[Arc<EntityAttributeDefinition>] {
        &self.columns
    }

    pub fn payload(&self) -> &StructuredPayload {
        &self.payload
    }

    pub fn parameter_name(&self) -> &str {
        &self.payload.parameter_name
    }

    /// Quoted name of the table type.
    pub fn table_type_name(&self, qualifier: &dyn NameQualifier) -> String {
        let container = if self.table_type.container.is_empty() {
            self.definition.entity_container()
        } else {
            self.table_type.container
        };
        format!(
            "{}.{}",
            qualifier.escape(container),
            qualifier.escape(self.table_type.name)
        )
    }

    /// Pair each structure column with the target column of the same
    /// physical name.
    pub(crate) fn map_columns(&self, target: &EntityDefinition) -> Vec<ColumnMapping> {
        self.columns
            .iter()
            .map(|column| ColumnMapping {
                structure: Arc::clone(column),
                target: target.direct_column(column.physical_name).cloned(),
            })
            .collect()
    }

    /// The structure columns matching `target`'s primary key.
    pub(crate) fn primary_key_keys(
        &self,
        target: &EntityDefinition,
    ) -> Result<Vec<Arc<EntityAttributeDefinition>>> {
        let keys: Vec<Arc<EntityAttributeDefinition>> = target
            .primary_key_attributes()
            .map(|key| {
                self.columns
                    .iter()
                    .find(|c| c.physical_name.eq_ignore_ascii_case(key.physical_name))
                    .cloned()
                    .ok_or_else(|| {
                        Error::lookup(
                            LookupErrorKind::Column,
                            key.physical_name,
                            self.definition.entity_name(),
                        )
                    })
            })
            .collect::<Result<_>>()?;
        if keys.is_empty() {
            return Err(Error::argument(
                "keys",
                format!(
                    "'{}' has no primary key to match on; pass explicit keys",
                    target.entity_name()
                ),
            ));
        }
        Ok(keys)
    }
}

impl<S> fmt::Debug for StructuredCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredCommand")
            .field("entity", &self.definition.entity_name())
            .field("table_type", &self.table_type)
            .field("rows", &self.payload.rows.len())
            .finish()
    }
}

/// A structure column and its counterpart on the target table.
#[derive(Debug, Clone)]
pub(crate) struct ColumnMapping {
    pub structure: Arc<EntityAttributeDefinition>,
    pub target: Option<Arc<EntityAttributeDefinition>>,
}

impl ColumnMapping {
    /// Mapped to a target column the caller may write.
    pub fn is_writable(&self) -> bool {
        self.target.as_ref().is_some_and(|t| !t.is_identity_column())
    }
}

/// Shared rendering of the `@inserted` round trip.
pub(crate) struct ResultsClause<'a> {
    pub qualifier: &'a dyn NameQualifier,
    pub mappings: &'a [ColumnMapping],
    pub parameter: &'a str,
    pub keys: &'a [Arc<EntityAttributeDefinition>],
}

impl ResultsClause<'_> {
    pub const TABLE: &'static str = "@inserted";

    pub fn declare(&self, table_type: &str) -> String {
        format!("DECLARE {} {};", Self::TABLE, table_type)
    }

    /// `OUTPUT INSERTED.[a], ... INTO @inserted ([a], ...)`
    pub fn output(&self) -> String {
        let mapped: Vec<&ColumnMapping> =
            self.mappings.iter().filter(|m| m.target.is_some()).collect();
        let inserted: Vec<String> = mapped
            .iter()
            .filter_map(|m| m.target.as_ref())
            .map(|t| format!("INSERTED.{}", self.qualifier.escape(t.physical_name)))
            .collect();
        let into: Vec<String> = mapped
            .iter()
            .map(|m| self.qualifier.escape(m.structure.physical_name))
            .collect();
        format!(
            "OUTPUT {} INTO {} ({})",
            inserted.join(", "),
            Self::TABLE,
            into.join(", ")
        )
    }

    /// Re-join `@inserted` to the structured parameter on the keys.
    pub fn select(&self) -> String {
        let columns: Vec<String> = self
            .mappings
            .iter()
            .map(|m| {
                let source = if m.target.is_some() { "i" } else { "tvp" };
                format!(
                    "{}.{}",
                    source,
                    self.qualifier.escape(m.structure.physical_name)
                )
            })
            .collect();
        let on: Vec<String> = self
            .keys
            .iter()
            .map(|k| {
                let column = self.qualifier.escape(k.physical_name);
                format!("i.{column} = tvp.{column}")
            })
            .collect();
        format!(
            "SELECT {} FROM {} AS i\nINNER JOIN {} AS tvp ON {};",
            columns.join(", "),
            Self::TABLE,
            self.parameter,
            on.join(" AND ")
        )
    }
}
