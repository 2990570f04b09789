//! Table-valued INSERT.

use crate::command::{ColumnMapping, ResultsClause, StructuredCommand, StructuredPayload};
use sqlentity_core::{
    Attr, Entity, EntityAttributeDefinition, EntityDefinition, EntityDefinitionProvider,
    EntityValues, Error, NameQualifier, Result, TransactSqlQualifier,
};
use std::fmt;
use std::sync::Arc;

/// Inserts a batch of `S` rows into a target table in one statement.
///
/// ```ignore
/// let command = StructuredInsertCommand::new(&rows)?
///     .insert_into::<FieldValueRow>()?
///     .select_results(&[])?;
/// let sql = command.command_text()?;
/// ```
pub struct StructuredInsertCommand<S, Q = TransactSqlQualifier> {
    command: StructuredCommand<S>,
    qualifier: Q,
    target: Option<Arc<EntityDefinition>>,
    result_keys: Option<Vec<Arc<EntityAttributeDefinition>>>,
}

impl<S: EntityValues> StructuredInsertCommand<S> {
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

impl<S: EntityValues, Q: NameQualifier> StructuredInsertCommand<S, Q> {
    pub fn with_qualifier(items: &[S], qualifier: Q) -> Result<Self> {
        Ok(Self::from_command(StructuredCommand::new(items)?, qualifier))
    }

    pub fn from_command(command: StructuredCommand<S>, qualifier: Q) -> Self {
        Self {
            command,
            qualifier,
            target: None,
            result_keys: None,
        }
    }

    /// Insert into `R`'s table.
    pub fn insert_into<R: Entity>(mut self) -> Result<Self> {
        self.target = Some(self.command.resolve_target::<R>()?);
        Ok(self)
    }

    /// Return the inserted rows, matched back to the batch on `keys`, or on
    /// the target's primary key when `keys` is empty.
    ///
    /// When the target key is server-generated the batch only carries
    /// placeholder values for it, so the primary key fallback cannot match
    /// new rows back to their batch rows. Pass natural keys in that case.
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

        let inserted: Vec<&ColumnMapping> = mappings.iter().filter(|m| m.is_writable()).collect();
        if inserted.is_empty() {
            return Err(Error::argument(
                "target",
                format!(
                    "'{}' shares no writable column with '{}'",
                    target.entity_name(),
                    self.command.definition().entity_name()
                ),
            ));
        }
        let target_columns: Vec<String> = inserted
            .iter()
            .filter_map(|m| m.target.as_ref())
            .map(|t| q.escape(t.physical_name))
            .collect();
        let source_columns: Vec<String> = inserted
            .iter()
            .map(|m| format!("tvp.{}", q.escape(m.structure.physical_name)))
            .collect();

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
            "INSERT INTO {} ({})",
            q.canonical_table_name(target.location()),
            target_columns.join(", ")
        ));
        if let Some(results) = &results {
            lines.push(results.output());
        }
        lines.push(format!(
            "SELECT {} FROM {} AS tvp;",
            source_columns.join(", "),
            parameter
        ));
        if let Some(results) = &results {
            lines.push(results.select());
        }
        let text = lines.join("\n");

        tracing::debug!(
            structure = self.command.definition().entity_name(),
            target = target.entity_name(),
            rows = self.payload().len(),
            "Compiled structured insert"
        );
        tracing::trace!(sql = %text, "Structured insert text");
        Ok(text)
    }

    fn target(&self) -> Result<&Arc<EntityDefinition>> {
        self.target
            .as_ref()
            .ok_or_else(|| Error::argument("target", "insert_into has not been called"))
    }
}

impl<S, Q> fmt::Debug for StructuredInsertCommand<S, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredInsertCommand")
            .field("command", &self.command)
            .field("target", &self.target.as_ref().map(|t| t.entity_name()))
            .field("returns_results", &self.result_keys.is_some())
            .finish()
    }
}
