//! UPDATE compilation.

use crate::compiler::{
    CompiledStatement, QueryFactory, SqlQueryFactory, TransactSqlQueryFactory,
    ensure_table_statement,
};
use crate::filter::where_clause;
use crate::join::JoinClause;
use crate::selection::ItemSelection;
use sqlentity_core::{
    Attr, Entity, EntityAttributeDefinition, EntityValues, Error, LookupErrorKind,
    NameQualifier, Result, TransactSqlQualifier, Value,
};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// One `column = value` pair of a SET clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub attribute: Arc<EntityAttributeDefinition>,
    pub value: Value,
}

/// An UPDATE of the rows an [`ItemSelection`] matches.
///
/// SET parameters are numbered before WHERE parameters. NULL values are
/// written as `column = NULL` and take no parameter.
pub struct SqlUpdate<T, Q = TransactSqlQualifier> {
    selection: ItemSelection<T>,
    factory: SqlQueryFactory<Q>,
    assignments: Vec<Assignment>,
    statement: OnceLock<CompiledStatement>,
}

impl<T: Entity> SqlUpdate<T> {
    pub fn new(selection: ItemSelection<T>) -> Self {
        Self::with_factory(selection, TransactSqlQueryFactory::default())
    }
}

impl<T: Entity, Q: NameQualifier> SqlUpdate<T, Q> {
    pub fn with_factory(selection: ItemSelection<T>, factory: SqlQueryFactory<Q>) -> Self {
        Self {
            selection,
            factory,
            assignments: Vec::new(),
            statement: OnceLock::new(),
        }
    }

    /// Set every updateable attribute to the value `item` holds.
    pub fn set(mut self, item: &T) -> Result<Self>
    where
        T: EntityValues,
    {
        let attributes: Vec<Arc<EntityAttributeDefinition>> = self
            .selection
            .definition()
            .updateable_attributes()
            .cloned()
            .collect();
        for attribute in attributes {
            let value = read(item, &attribute, self.selection.definition().entity_name())?;
            self.assign(attribute, value);
        }
        Ok(self)
    }

    /// Set the given attributes to the values `item` holds, in this order.
    pub fn set_attributes(mut self, item: &T, attributes: &[Attr<T>]) -> Result<Self>
    where
        T: EntityValues,
    {
        for attribute in attributes {
            let attribute = self.settable(*attribute)?;
            let value = read(item, &attribute, self.selection.definition().entity_name())?;
            self.assign(attribute, value);
        }
        Ok(self)
    }

    /// Set one attribute to an explicit value.
    pub fn set_value(mut self, attribute: Attr<T>, value: impl Into<Value>) -> Result<Self> {
        let attribute = self.settable(attribute)?;
        self.assign(attribute, value.into());
        Ok(self)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn selection(&self) -> &ItemSelection<T> {
        &self.selection
    }

    /// The compiled statement, compiled on first access.
    pub fn statement(&self) -> Result<&CompiledStatement> {
        if let Some(statement) = self.statement.get() {
            return Ok(statement);
        }
        let compiled = self.compile()?;
        Ok(self.statement.get_or_init(|| compiled))
    }

    pub fn execution_statement(&self) -> Result<&str> {
        Ok(self.statement()?.execution_statement())
    }

    pub fn execution_parameters(&self) -> Result<&[Value]> {
        Ok(self.statement()?.execution_parameters())
    }

    /// `UPDATE table SET... [FROM table JOIN...] WHERE...`
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn compile(&self) -> Result<CompiledStatement> {
        ensure_table_statement(&self.selection, "UPDATE")?;
        if self.assignments.is_empty() {
            return Err(Error::argument(
                "assignments",
                "an UPDATE needs at least one assignment",
            ));
        }

        let qualifier = self.factory.qualifier();
        let root = self.selection.root();
        let mut params = Vec::new();

        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|assignment| {
                let column = qualifier.qualified_name(&assignment.attribute);
                if assignment.value.is_null() {
                    format!("{column} = NULL")
                } else {
                    let placeholder = qualifier.parameter(params.len());
                    params.push(assignment.value.clone());
                    format!("{column} = {placeholder}")
                }
            })
            .collect();

        let relations = self.selection.relations().relations();
        let mut sql = match JoinClause::create(relations, qualifier, None) {
            Some(joins) => format!(
                "UPDATE {}\nSET {}\nFROM {}\n{}",
                qualifier.table_name(root),
                sets.join(", "),
                qualifier.table_source(root),
                joins
            ),
            None => format!(
                "UPDATE {}\nSET {}",
                qualifier.table_source(root),
                sets.join(", ")
            ),
        };
        if let Some(predicate) =
            where_clause(self.selection.filters(), qualifier, None, &mut params)
        {
            sql.push_str("\nWHERE ");
            sql.push_str(&predicate);
        }

        tracing::trace!(sql = %sql, parameters = params.len(), "Compiled UPDATE");
        Ok(CompiledStatement::new(sql, params))
    }

    fn settable(&self, attribute: Attr<T>) -> Result<Arc<EntityAttributeDefinition>> {
        let resolved = self.selection.definition().attribute(attribute.reference())?;
        if !resolved.is_direct() {
            return Err(Error::argument(
                "attribute",
                format!(
                    "'{}' does not live on the updated table",
                    resolved.reference_name
                ),
            ));
        }
        if resolved.is_identity_column() {
            return Err(Error::argument(
                "attribute",
                format!("'{}' is generated by the server", resolved.reference_name),
            ));
        }
        Ok(Arc::clone(resolved))
    }

    /// Add or replace the assignment of `attribute`, keeping its position.
    fn assign(&mut self, attribute: Arc<EntityAttributeDefinition>, value: Value) {
        self.statement = OnceLock::new();
        match self
            .assignments
            .iter_mut()
            .find(|a| a.attribute.ordinal == attribute.ordinal)
        {
            Some(existing) => existing.value = value,
            None => self.assignments.push(Assignment { attribute, value }),
        }
    }
}

impl<T, Q: fmt::Debug> fmt::Debug for SqlUpdate<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlUpdate")
            .field("selection", &self.selection)
            .field("assignments", &self.assignments)
            .field("factory", &self.factory)
            .finish()
    }
}

fn read<T: EntityValues>(
    item: &T,
    attribute: &EntityAttributeDefinition,
    entity: &str,
) -> Result<Value> {
    item.value(attribute.property_name)
        .ok_or_else(|| Error::lookup(LookupErrorKind::Accessor, attribute.property_name, entity))
}
