//! Raised entity materialization for sqlentity.
//!
//! A result row of a raised selection carries the columns of the root entity
//! and of every joined relation, named by reference name
//! (`Customer.Address.City`). [`RaisedPocoFactory`] turns such a row into a
//! nested entity graph:
//!
//! 1. A [`BindingPlan`] maps every property at every depth to a reader
//!    column. Plans are cached per (definition, reader columns).
//! 2. [`RecordGraph`] reads the row into one [`RecordData`] per entity,
//!    leaving relations that the row does not contain empty.
//! 3. [`FromRecord`] implementations build the caller's types from
//!    [`EntityRecord`] views.
//!
//! [`MaterializationScope`] shares nested records whose key repeats across
//! the rows of one result set.

pub mod factory;
pub mod graph;
pub mod plan;
pub mod scope;

pub use factory::{PocoDataRequest, RaisedPocoFactory, materialize};
pub use graph::{EntityRecord, FromRecord, RecordData, RecordGraph};
pub use plan::{BindingPlan, FieldBinding, PlanNode};
pub use scope::{KeyValues, MaterializationScope};
