//! Reuse of nested records across the rows of one result set.

use crate::graph::RecordData;
use crate::plan::BindingPlan;
use sqlentity_core::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Primary key values of one record, usable as a map key.
///
/// Floats compare and hash by their bit pattern, so `NaN` keys are equal to
/// themselves.
#[derive(Debug, Clone)]
pub struct KeyValues(Vec<Value>);

impl KeyValues {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Whether any part of the key is NULL.
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Value::is_null)
    }
}

impl PartialEq for KeyValues {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| same_value(a, b))
    }
}

impl Eq for KeyValues {}

impl Hash for KeyValues {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            hash_value(value, state);
        }
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::TinyInt(i) => {
            2u8.hash(state);
            i.hash(state);
        }
        Value::SmallInt(i) => {
            3u8.hash(state);
            i.hash(state);
        }
        Value::Int(i) => {
            4u8.hash(state);
            i.hash(state);
        }
        Value::BigInt(i) => {
            5u8.hash(state);
            i.hash(state);
        }
        Value::Double(f) => {
            6u8.hash(state);
            f.to_bits().hash(state);
        }
        Value::Decimal(s) => {
            7u8.hash(state);
            s.hash(state);
        }
        Value::Text(s) => {
            8u8.hash(state);
            s.hash(state);
        }
        Value::Bytes(b) => {
            9u8.hash(state);
            b.hash(state);
        }
        Value::Uuid(u) => {
            10u8.hash(state);
            u.hash(state);
        }
        Value::Timestamp(ts) => {
            11u8.hash(state);
            ts.hash(state);
        }
    }
}

/// Shares nested records whose key repeats across rows.
///
/// When one customer appears on many order rows, every order's `Customer`
/// relation points at the same [`RecordData`]. A scope is tied to the plan
/// it first sees; materializing with a different plan starts over.
#[derive(Debug, Default)]
pub struct MaterializationScope {
    plan: Option<Arc<BindingPlan>>,
    records: HashMap<(usize, KeyValues), Arc<RecordData>>,
}

impl MaterializationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nested records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.plan = None;
        self.records.clear();
    }

    pub(crate) fn enter(&mut self, plan: &Arc<BindingPlan>) {
        let same = self.plan.as_ref().is_some_and(|p| Arc::ptr_eq(p, plan));
        if !same {
            if self.plan.is_some() {
                tracing::debug!(released = self.records.len(), "Binding plan changed, scope reset");
            }
            self.records.clear();
            self.plan = Some(Arc::clone(plan));
        }
    }

    /// The record already held for `key` on `node`, or `data` after storing it.
    pub(crate) fn share(
        &mut self,
        node: usize,
        key: KeyValues,
        data: impl FnOnce() -> RecordData,
    ) -> Arc<RecordData> {
        Arc::clone(
            self.records
                .entry((node, key))
                .or_insert_with(|| Arc::new(data())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_values_equality() {
        let a = KeyValues::new(vec![Value::Int(1), Value::from("x")]);
        let b = KeyValues::new(vec![Value::Int(1), Value::from("x")]);
        let c = KeyValues::new(vec![Value::BigInt(1), Value::from("x")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_nan_keys_match_bitwise() {
        let a = KeyValues::new(vec![Value::Double(f64::NAN)]);
        let b = KeyValues::new(vec![Value::Double(f64::NAN)]);
        assert_eq!(a, b);
        assert_ne!(
            KeyValues::new(vec![Value::Double(0.0)]),
            KeyValues::new(vec![Value::Double(-0.0)])
        );
    }

    #[test]
    fn test_has_null() {
        assert!(KeyValues::new(vec![Value::Int(1), Value::Null]).has_null());
        assert!(!KeyValues::new(vec![Value::Int(1)]).has_null());
    }
}
