//! Per-row record graphs and typed access to them.

use crate::plan::{BindingPlan, PlanNode};
use crate::scope::{KeyValues, MaterializationScope};
use sqlentity_core::{Error, FromValue, LookupErrorKind, RecordReader, Result, Value};
use std::sync::Arc;

/// Values read for one entity of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordData {
    node: usize,
    /// One slot per plan field; `None` when the column was not projected
    values: Vec<Option<Value>>,
}

impl RecordData {
    /// Plan node this record belongs to.
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }
}

/// Everything one reader row materializes into.
///
/// Slots are indexed like the plan's nodes. A nested slot is empty when the
/// relation is absent from the row (a LEFT JOIN miss, or an absent parent).
#[derive(Debug, Clone)]
pub struct RecordGraph {
    plan: Arc<BindingPlan>,
    slots: Vec<Option<Arc<RecordData>>>,
}

impl RecordGraph {
    /// Read the current row of `reader` through `plan`.
    pub fn read(
        plan: Arc<BindingPlan>,
        reader: &dyn RecordReader,
        mut scope: Option<&mut MaterializationScope>,
    ) -> Result<Self> {
        if let Some(scope) = scope.as_deref_mut() {
            scope.enter(&plan);
        }

        let mut slots: Vec<Option<Arc<RecordData>>> = Vec::with_capacity(plan.nodes().len());
        for (index, node) in plan.nodes().iter().enumerate() {
            if let Some(parent) = node.parent {
                if slots[parent].is_none() {
                    slots.push(None);
                    continue;
                }
            }

            let values = read_values(node, reader)?;
            if !node.is_root() && !is_present(node, &values) {
                slots.push(None);
                continue;
            }

            let data = RecordData {
                node: index,
                values,
            };
            let keys = key_values(node, &data.values);
            let data = match (scope.as_deref_mut(), keys) {
                (Some(scope), Some(keys)) if !node.is_root() => scope.share(index, keys, || data),
                _ => Arc::new(data),
            };
            slots.push(Some(data));
        }

        Ok(Self { plan, slots })
    }

    pub fn plan(&self) -> &Arc<BindingPlan> {
        &self.plan
    }

    pub fn slot(&self, node: usize) -> Option<&Arc<RecordData>> {
        self.slots.get(node).and_then(Option::as_ref)
    }

    /// The root entity's record.
    pub fn root(&self) -> Result<EntityRecord<'_>> {
        self.record(0).ok_or_else(|| {
            Error::lookup(
                LookupErrorKind::Location,
                self.plan.root().location.to_string(),
                self.plan.root().entity,
            )
        })
    }

    fn record(&self, node: usize) -> Option<EntityRecord<'_>> {
        let data = self.slot(node)?;
        let plan_node = self.plan.node(node)?;
        Some(EntityRecord {
            graph: self,
            node: plan_node,
            data,
        })
    }
}

fn read_values(node: &PlanNode, reader: &dyn RecordReader) -> Result<Vec<Option<Value>>> {
    node.fields
        .iter()
        .map(|field| match field.ordinal {
            None => Ok(None),
            Some(ordinal) => reader.value(ordinal).cloned().map(Some).ok_or_else(|| {
                Error::lookup(LookupErrorKind::Column, field.column.as_str(), node.entity)
            }),
        })
        .collect()
}

/// A nested entity is present when its bound key has no NULL part, or,
/// without a bound key, when any bound value is not NULL.
fn is_present(node: &PlanNode, values: &[Option<Value>]) -> bool {
    let mut keys = node.bound_keys().peekable();
    if keys.peek().is_some() {
        keys.all(|(i, _)| values[i].as_ref().is_some_and(|v| !v.is_null()))
    } else {
        values.iter().flatten().any(|v| !v.is_null())
    }
}

/// Sharing key of a record: every key field must be projected and not NULL.
fn key_values(node: &PlanNode, values: &[Option<Value>]) -> Option<KeyValues> {
    let keys = node
        .fields
        .iter()
        .zip(values)
        .filter(|(field, _)| field.key)
        .map(|(_, value)| value.clone())
        .collect::<Option<Vec<Value>>>()?;
    let keys = KeyValues::new(keys);
    (!keys.values().is_empty() && !keys.has_null()).then_some(keys)
}

/// Conversion from a materialized record.
pub trait FromRecord: Sized {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self>;
}

/// Typed view over one entity of a [`RecordGraph`].
#[derive(Debug, Clone, Copy)]
pub struct EntityRecord<'g> {
    graph: &'g RecordGraph,
    node: &'g PlanNode,
    data: &'g Arc<RecordData>,
}

impl<'g> EntityRecord<'g> {
    pub fn entity_name(&self) -> &'static str {
        self.node.entity
    }

    pub fn data(&self) -> &'g Arc<RecordData> {
        self.data
    }

    /// The raw value of a scalar property, `None` when it is not a property
    /// of this entity or was not projected.
    pub fn value(&self, property: &str) -> Option<&'g Value> {
        let (index, _) = self.node.field(property)?;
        self.data.values[index].as_ref()
    }

    /// A scalar property converted to `V`.
    pub fn get<V: FromValue>(&self, property: &str) -> Result<V> {
        let (index, field) = self.node.field(property).ok_or_else(|| {
            Error::lookup(LookupErrorKind::Attribute, property, self.node.entity)
        })?;
        let value = self.data.values[index].as_ref().ok_or_else(|| {
            Error::lookup(LookupErrorKind::Column, field.column.as_str(), self.node.entity)
        })?;
        V::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(field.column.clone());
                Error::Type(te)
            }
            e => e,
        })
    }

    /// The record of a relation property, `None` when absent from the row.
    pub fn record(&self, property: &str) -> Result<Option<EntityRecord<'g>>> {
        let node = self.node.relation(property).ok_or_else(|| {
            Error::lookup(LookupErrorKind::Attribute, property, self.node.entity)
        })?;
        Ok(self.graph.record(node))
    }

    /// A relation property materialized as `R`.
    pub fn relation<R: FromRecord>(&self, property: &str) -> Result<Option<R>> {
        match self.record(property)? {
            Some(record) => R::from_record(&record).map(Some),
            None => Ok(None),
        }
    }
}
