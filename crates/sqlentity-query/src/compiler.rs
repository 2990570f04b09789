//! SELECT, CONTAINS and DELETE compilation.

use crate::filter::where_clause;
use crate::join::{JoinClause, Remap};
use crate::selection::ItemSelection;
use sqlentity_core::{
    EntityAttributeDefinition, Error, NameQualifier, Result, TransactSqlQualifier, Value,
};
use std::fmt;
use std::sync::OnceLock;

/// Statement text with its positional parameters.
///
/// Placeholder `i` in the text binds `parameters[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    text: String,
    parameters: Vec<Value>,
}

impl CompiledStatement {
    pub fn new(text: String, parameters: Vec<Value>) -> Self {
        Self { text, parameters }
    }

    pub fn execution_statement(&self) -> &str {
        &self.text
    }

    pub fn execution_parameters(&self) -> &[Value] {
        &self.parameters
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.text, self.parameters)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compiles selections into statements for one dialect.
pub trait QueryFactory {
    fn qualifier(&self) -> &dyn NameQualifier;

    /// `SELECT columns FROM source JOIN... WHERE...`, followed by any linked
    /// selections.
    #[tracing::instrument(level = "trace", skip(self, selection))]
    fn create_select<T>(&self, selection: &ItemSelection<T>) -> CompiledStatement {
        let mut params = Vec::new();
        let text = render_selection(selection, self.qualifier(), Projection::Columns, &mut params);
        tracing::trace!(sql = %text, parameters = params.len(), "Compiled SELECT");
        CompiledStatement::new(text, params)
    }

    /// A statement returning 1 when the selection has any row, else 0.
    #[tracing::instrument(level = "trace", skip(self, selection))]
    fn create_contains<T>(&self, selection: &ItemSelection<T>) -> CompiledStatement {
        let qualifier = self.qualifier();
        let mut params = Vec::new();
        let body = render_selection(selection, qualifier, Projection::One, &mut params);
        let text = qualifier.exists_statement(&body);
        tracing::trace!(sql = %text, parameters = params.len(), "Compiled CONTAINS");
        CompiledStatement::new(text, params)
    }

    /// `DELETE FROM table WHERE...`, or `DELETE table FROM table JOIN...
    /// WHERE...` when the selection has relations.
    ///
    /// Derived, linked and row-limited selections cannot be deleted.
    #[tracing::instrument(level = "trace", skip(self, selection))]
    fn create_delete<T>(&self, selection: &ItemSelection<T>) -> Result<CompiledStatement> {
        ensure_table_statement(selection, "DELETE")?;
        let qualifier = self.qualifier();
        let root = selection.root();
        let mut params = Vec::new();

        let mut sql = match JoinClause::create(selection.relations().relations(), qualifier, None) {
            Some(joins) => format!(
                "DELETE {}\nFROM {}\n{}",
                qualifier.table_name(root),
                qualifier.table_source(root),
                joins
            ),
            None => format!("DELETE FROM {}", qualifier.table_source(root)),
        };
        if let Some(predicate) = where_clause(selection.filters(), qualifier, None, &mut params) {
            sql.push_str("\nWHERE ");
            sql.push_str(&predicate);
        }

        tracing::trace!(sql = %sql, parameters = params.len(), "Compiled DELETE");
        Ok(CompiledStatement::new(sql, params))
    }
}

/// Query factory over a concrete name qualifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlQueryFactory<Q> {
    qualifier: Q,
}

impl<Q: NameQualifier> SqlQueryFactory<Q> {
    pub fn new(qualifier: Q) -> Self {
        Self { qualifier }
    }
}

impl<Q: NameQualifier> QueryFactory for SqlQueryFactory<Q> {
    fn qualifier(&self) -> &dyn NameQualifier {
        &self.qualifier
    }
}

/// Query factory for T-SQL.
pub type TransactSqlQueryFactory = SqlQueryFactory<TransactSqlQualifier>;

/// A selection bound to a factory, compiled once on first access.
pub struct SqlSelection<T, Q = TransactSqlQualifier> {
    selection: ItemSelection<T>,
    factory: SqlQueryFactory<Q>,
    statement: OnceLock<CompiledStatement>,
}

impl<T> SqlSelection<T> {
    pub fn new(selection: ItemSelection<T>) -> Self {
        Self::with_factory(selection, TransactSqlQueryFactory::default())
    }
}

impl<T, Q: NameQualifier> SqlSelection<T, Q> {
    pub fn with_factory(selection: ItemSelection<T>, factory: SqlQueryFactory<Q>) -> Self {
        Self {
            selection,
            factory,
            statement: OnceLock::new(),
        }
    }

    pub fn selection(&self) -> &ItemSelection<T> {
        &self.selection
    }

    pub fn statement(&self) -> &CompiledStatement {
        self.statement
            .get_or_init(|| self.factory.create_select(&self.selection))
    }

    pub fn execution_statement(&self) -> &str {
        self.statement().execution_statement()
    }

    pub fn execution_parameters(&self) -> &[Value] {
        self.statement().execution_parameters()
    }
}

impl<T, Q: fmt::Debug> fmt::Debug for SqlSelection<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlSelection")
            .field("selection", &self.selection)
            .field("factory", &self.factory)
            .field("compiled", &self.statement.get().is_some())
            .finish()
    }
}

/// Fails unless the selection reads straight from its table.
pub(crate) fn ensure_table_statement<T>(
    selection: &ItemSelection<T>,
    statement: &'static str,
) -> Result<()> {
    let problem = if selection.source().is_some() {
        Some("a derived source")
    } else if selection.linked().is_some() {
        Some("linked selections")
    } else if selection.row_limit().is_some() {
        Some("a row limit")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(Error::argument(
            "selection",
            format!("{statement} cannot be compiled for a selection with {problem}"),
        )),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    /// Projected attributes, aliased to their reference names
    Columns,
    /// Projected attributes without aliases, for derived sources
    Unaliased,
    /// The constant 1
    One,
}

fn render_selection<T>(
    selection: &ItemSelection<T>,
    qualifier: &dyn NameQualifier,
    projection: Projection,
    params: &mut Vec<Value>,
) -> String {
    let mut sql = render_member(selection, qualifier, projection, params);
    let mut current = selection.linked();
    while let Some((op, next)) = current {
        sql.push('\n');
        sql.push_str(op.as_sql());
        sql.push('\n');
        sql.push_str(&render_member(next, qualifier, projection, params));
        current = next.linked();
    }
    sql
}

fn render_member<T>(
    selection: &ItemSelection<T>,
    qualifier: &dyn NameQualifier,
    projection: Projection,
    params: &mut Vec<Value>,
) -> String {
    let root = selection.root();
    let entity_name = selection.definition().entity_name();

    // Parameters of a derived source precede the outer WHERE parameters.
    let mut derived_sql = None;
    if let Some(inner) = selection.source() {
        derived_sql = Some(render_selection(
            inner,
            qualifier,
            Projection::Unaliased,
            params,
        ));
    }
    let derived = derived_sql
        .as_ref()
        .map(|_| root.clone().with_alias(Some(entity_name)));
    let remap = derived.as_ref().map(|to| Remap { from: root, to });

    let mut sql = String::from("SELECT ");
    if let Some(prefix) = selection
        .row_limit()
        .and_then(|limit| qualifier.row_limit_prefix(limit))
    {
        sql.push_str(&prefix);
        sql.push(' ');
    }

    match projection {
        Projection::One => sql.push('1'),
        Projection::Columns | Projection::Unaliased => {
            let columns: Vec<String> = selection
                .projected_attributes()
                .iter()
                .map(|a| {
                    column_sql(
                        qualifier,
                        a,
                        remap.as_ref(),
                        projection == Projection::Columns,
                    )
                })
                .collect();
            sql.push_str(&columns.join(", "));
        }
    }

    sql.push_str("\nFROM ");
    match &derived_sql {
        Some(inner) => {
            sql.push_str(&format!("({}) AS {}", inner, qualifier.escape(entity_name)));
        }
        None => sql.push_str(&qualifier.table_source(root)),
    }

    if let Some(joins) =
        JoinClause::create(selection.relations().relations(), qualifier, remap.as_ref())
    {
        sql.push('\n');
        sql.push_str(&joins);
    }

    if let Some(predicate) = where_clause(selection.filters(), qualifier, remap.as_ref(), params) {
        sql.push_str("\nWHERE ");
        sql.push_str(&predicate);
    }

    if let Some(suffix) = selection
        .row_limit()
        .and_then(|limit| qualifier.row_limit_suffix(limit))
    {
        sql.push('\n');
        sql.push_str(&suffix);
    }
    sql
}

fn column_sql(
    qualifier: &dyn NameQualifier,
    attribute: &EntityAttributeDefinition,
    remap: Option<&Remap<'_>>,
    aliased: bool,
) -> String {
    let location = attribute.resolved_location();
    let location = remap.map_or(location, |r| r.apply(location));
    let column = qualifier.qualified_column(location, attribute.physical_name);
    match &attribute.alias {
        Some(alias) if aliased => format!("{} AS {}", column, qualifier.escape(alias)),
        _ => column,
    }
}
