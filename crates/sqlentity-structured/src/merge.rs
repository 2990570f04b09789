//! Table-valued MERGE.

use crate::command::{ColumnMapping, ResultsClause, StructuredCommand, StructuredPayload};
use sqlentity_core::{
    Attr, Entity, EntityAttributeDefinition, EntityDefinition, EntityDefinitionProvider,
    EntityValues, Error, LookupErrorKind, NameQualifier, Result, TransactSqlQualifier,
};
use std::fmt;
use std::sync::Arc;

const TARGET: &str = "Target";
const SOURCE: &str = "Source";

/// Upserts a batch of `S` rows into a target table.
///
/// Rows are matched on the merge keys; matched rows have their remaining
/// writable columns updated, the rest are inserted. Deleting target rows
/// missing from the batch is opt-in through
/// [`delete_unmatched_in_source`](Self::delete_unmatched_in_source).
pub struct StructuredMergeCommand<S, Q = TransactSqlQualifier> {
    command: StructuredCommand<S>,
    qualifier: Q,
    target: Option<Arc<EntityDefinition>>,
    merge_keys: Vec<Arc<EntityAttributeDefinition>>,
    delete_constraints: Option<Vec<Arc<EntityAttributeDefinition>>>,
    result_keys: Option<Vec<Arc<EntityAttributeDefinition>>>,
}

impl<S: EntityValues> StructuredMergeCommand<S> {
    pub fn new(items: &[S]) -> Result<Self> {
        Self::with_qualifier(items, TransactSqlQualifier)
    }

    /// Build the batch and resolve its target through `provider`.
    pub fn with_provider(provider: Arc<EntityDefinitionProvider>, items: &[S]) -> Result<Self> {
        Ok(Self::from_command(
            StructuredCommand::with_provider(provider, items)?,
            TransactSqlQualifier,
        ))
    }
}

impl<S: EntityValues, Q: NameQualifier> StructuredMergeCommand<S, Q> {
    pub fn with_qualifier(items: &[S], qualifier: Q) -> Result<Self> {
        Ok(Self::from_command(StructuredCommand::new(items)?, qualifier))
    }

    pub fn from_command(command: StructuredCommand<S>, qualifier: Q) -> Self {
        Self {
            command,
            qualifier,
            target: None,
            merge_keys: Vec::new(),
            delete_constraints: None,
            result_keys: None,
        }
    }

    /// Merge into `R`'s table, matching rows on `keys`, or on the target's
    /// primary key when `keys` is empty.
    pub fn merge_into<R: Entity>(mut self, keys: &[Attr<S>]) -> Result<Self> {
        let target = self.command.resolve_target::<R>()?;
        self.merge_keys = if keys.is_empty() {
            self.command.primary_key_keys(&target)?
        } else {
            self.command.keys(keys)?
        };
        self.target = Some(target);
        Ok(self)
    }

    /// Delete target rows the batch does not contain.
    ///
    /// Each constraint limits the delete to target rows whose column value
    /// appears somewhere in the batch, so a batch scoped to one parent only
    /// prunes that parent's rows.
    pub fn delete_unmatched_in_source(mut self, constraints: &[Attr<S>]) -> Result<Self> {
        self.delete_constraints = Some(self.command.keys(constraints)?);
        Ok(self)
    }

    /// Return the merged rows, matched back to the batch on `keys`, or on
    /// the target's primary key when `keys` is empty.
    pub fn select_results(mut self, keys: &[Attr<S>]) -> Result<Self> {
        let target = self.target()?;
        let keys = if keys.is_empty() {
            self.command.primary_key_keys(target)?
        } else {
            self.command.keys(keys)?
        };
        self.result_keys = Some(keys);
        Ok(self)
    }

    pub fn payload(&self) -> &StructuredPayload {
        self.command.payload()
    }

    pub fn command(&self) -> &StructuredCommand<S> {
        &self.command
    }

    /// Compile the command text.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn command_text(&self) -> Result<String> {
        let target = self.target()?;
        let q: &dyn NameQualifier = &self.qualifier;
        let mappings = self.command.map_columns(target);
        let parameter = self.command.parameter_name();
        let target_alias = q.escape(TARGET);
        let source_alias = q.escape(SOURCE);

        let on = self
            .merge_keys
            .iter()
            .map(|key| {
                let column = target_column(&mappings, key, target)?;
                Ok(format!(
                    "{}.{} = {}.{}",
                    target_alias,
                    q.escape(column.physical_name),
                    source_alias,
                    q.escape(key.physical_name)
                ))
            })
            .collect::<Result<Vec<String>>>()?;

        let writable: Vec<&ColumnMapping> = mappings.iter().filter(|m| m.is_writable()).collect();
        if writable.is_empty() {
            return Err(Error::argument(
                "target",
                format!(
                    "'{}' shares no writable column with '{}'",
                    target.entity_name(),
                    self.command.definition().entity_name()
                ),
            ));
        }

        let results = self.result_keys.as_deref().map(|keys| ResultsClause {
            qualifier: q,
            mappings: &mappings,
            parameter,
            keys,
        });

        let mut lines = Vec::new();
        if let Some(results) = &results {
            lines.push(results.declare(&self.command.table_type_name(q)));
        }
        lines.push(format!(
            "MERGE {} AS {}",
            q.canonical_table_name(target.location()),
            target_alias
        ));
        lines.push(format!("USING {} AS {}", parameter, source_alias));
        lines.push(format!("ON ({})", on.join(" AND ")));

        let updates: Vec<String> = writable
            .iter()
            .filter(|m| {
                !self
                    .merge_keys
                    .iter()
                    .any(|k| k.ordinal == m.structure.ordinal)
            })
            .filter_map(|m| {
                m.target.as_ref().map(|t| {
                    format!(
                        "{}.{} = {}.{}",
                        target_alias,
                        q.escape(t.physical_name),
                        source_alias,
                        q.escape(m.structure.physical_name)
                    )
                })
            })
            .collect();
        if !updates.is_empty() {
            lines.push(format!("WHEN MATCHED THEN UPDATE SET {}", updates.join(", ")));
        }

        let insert_columns: Vec<String> = writable
            .iter()
            .filter_map(|m| m.target.as_ref())
            .map(|t| q.escape(t.physical_name))
            .collect();
        let insert_values: Vec<String> = writable
            .iter()
            .map(|m| format!("{}.{}", source_alias, q.escape(m.structure.physical_name)))
            .collect();
        lines.push(format!(
            "WHEN NOT MATCHED BY TARGET THEN INSERT ({}) VALUES ({})",
            insert_columns.join(", "),
            insert_values.join(", ")
        ));

        if let Some(constraints) = &self.delete_constraints {
            let mut clause = String::from("WHEN NOT MATCHED BY SOURCE");
            for constraint in constraints {
                let column = target_column(&mappings, constraint, target)?;
                let source = q.escape(constraint.physical_name);
                clause.push_str(&format!(
                    " AND {}.{} IN (SELECT tvp.{} FROM {} AS tvp)",
                    target_alias,
                    q.escape(column.physical_name),
                    source,
                    parameter
                ));
            }
            clause.push_str(" THEN DELETE");
            lines.push(clause);
        }

        if let Some(results) = &results {
            lines.push(results.output());
        }
        // MERGE must be terminated.
        if let Some(last) = lines.last_mut() {
            last.push(';');
        }
        if let Some(results) = &results {
            lines.push(results.select());
        }
        let text = lines.join("\n");

        tracing::debug!(
            structure = self.command.definition().entity_name(),
            target = target.entity_name(),
            rows = self.payload().len(),
            deletes = self.delete_constraints.is_some(),
            "Compiled structured merge"
        );
        tracing::trace!(sql = %text, "Structured merge text");
        Ok(text)
    }

    fn target(&self) -> Result<&Arc<EntityDefinition>> {
        self.target
            .as_ref()
            .ok_or_else(|| Error::argument("target", "merge_into has not been called"))
    }
}

impl<S, Q> fmt::Debug for StructuredMergeCommand<S, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredMergeCommand")
            .field("command", &self.command)
            .field("target", &self.target.as_ref().map(|t| t.entity_name()))
            .field(
                "merge_keys",
                &self
                    .merge_keys
                    .iter()
                    .map(|k| k.reference_name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("deletes", &self.delete_constraints.is_some())
            .field("returns_results", &self.result_keys.is_some())
            .finish()
    }
}

/// The target column a structure column maps to.
fn target_column<'a>(
    mappings: &'a [ColumnMapping],
    structure: &EntityAttributeDefinition,
    target: &EntityDefinition,
) -> Result<&'a Arc<EntityAttributeDefinition>> {
    mappings
        .iter()
        .find(|m| m.structure.ordinal == structure.ordinal)
        .and_then(|m| m.target.as_ref())
        .ok_or_else(|| {
            Error::lookup(
                LookupErrorKind::Column,
                structure.physical_name,
                target.entity_name(),
            )
        })
}
