//! WHERE clause predicates.

use crate::join::Remap;
use sqlentity_core::{EntityAttributeDefinition, NameQualifier, Value};
use std::sync::Arc;

/// Comparison applied by a [`ValueFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// `= @i`, or `IS NULL` for a NULL value
    Equal(Value),
    /// `<> @i`, or `IS NOT NULL` for a NULL value
    NotEqual(Value),
    Like(Value),
    NotLike(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Between(Value, Value),
    /// `>= @i`
    AtLeast(Value),
    /// `<= @i`
    AtMost(Value),
    IsNull,
    IsNotNull,
}

/// One predicate on one attribute.
#[derive(Debug, Clone)]
pub struct ValueFilter {
    pub attribute: Arc<EntityAttributeDefinition>,
    pub kind: FilterKind,
}

impl ValueFilter {
    pub fn new(attribute: Arc<EntityAttributeDefinition>, kind: FilterKind) -> Self {
        Self { attribute, kind }
    }

    /// Number of parameter slots this filter consumes.
    pub fn parameter_count(&self) -> usize {
        match &self.kind {
            FilterKind::Equal(v) | FilterKind::NotEqual(v) => usize::from(!v.is_null()),
            FilterKind::Like(_)
            | FilterKind::NotLike(_)
            | FilterKind::AtLeast(_)
            | FilterKind::AtMost(_) => 1,
            FilterKind::In(values) | FilterKind::NotIn(values) => values.len(),
            FilterKind::Between(..) => 2,
            FilterKind::IsNull | FilterKind::IsNotNull => 0,
        }
    }

    /// Render the predicate, appending its values to `params`.
    ///
    /// Placeholders are numbered from the current length of `params`, so
    /// filters rendered in sequence share one running index.
    pub fn to_sql(
        &self,
        qualifier: &dyn NameQualifier,
        root: Option<&Remap<'_>>,
        params: &mut Vec<Value>,
    ) -> String {
        let location = self.attribute.resolved_location();
        let location = root.map_or(location, |r| r.apply(location));
        let column = qualifier.qualified_column(location, self.attribute.physical_name);

        let mut bind = |value: &Value| {
            let placeholder = qualifier.parameter(params.len());
            params.push(value.clone());
            placeholder
        };

        match &self.kind {
            FilterKind::Equal(Value::Null) | FilterKind::IsNull => format!("{column} IS NULL"),
            FilterKind::NotEqual(Value::Null) | FilterKind::IsNotNull => {
                format!("{column} IS NOT NULL")
            }
            FilterKind::Equal(value) => format!("{column} = {}", bind(value)),
            FilterKind::NotEqual(value) => format!("{column} <> {}", bind(value)),
            FilterKind::Like(value) => format!("{column} LIKE {}", bind(value)),
            FilterKind::NotLike(value) => format!("{column} NOT LIKE {}", bind(value)),
            FilterKind::In(values) => {
                let list: Vec<String> = values.iter().map(&mut bind).collect();
                format!("{column} IN ({})", list.join(", "))
            }
            FilterKind::NotIn(values) => {
                let list: Vec<String> = values.iter().map(&mut bind).collect();
                format!("{column} NOT IN ({})", list.join(", "))
            }
            FilterKind::Between(low, high) => {
                let low = bind(low);
                let high = bind(high);
                format!("{column} BETWEEN {low} AND {high}")
            }
            FilterKind::AtLeast(value) => format!("{column} >= {}", bind(value)),
            FilterKind::AtMost(value) => format!("{column} <= {}", bind(value)),
        }
    }
}

/// Render filters joined with `AND`, or `None` when there are none.
pub fn where_clause(
    filters: &[ValueFilter],
    qualifier: &dyn NameQualifier,
    root: Option<&Remap<'_>>,
    params: &mut Vec<Value>,
) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    let predicates: Vec<String> = filters
        .iter()
        .map(|f| f.to_sql(qualifier, root, params))
        .collect();
    Some(predicates.join(" AND "))
}
