//! Statement compilation for sqlentity.
//!
//! `sqlentity-query` turns resolved entity definitions into parameterized
//! SQL:
//!
//! - [`EntityRelationSet`] holds the ordered joins of a selection
//! - [`ItemSelection`] collects filters, projection, row limit and linked
//!   selections
//! - [`QueryFactory`] compiles SELECT, CONTAINS and DELETE statements
//! - [`SqlUpdate`] compiles UPDATE statements
//!
//! Every compiled statement numbers its placeholders in text order, so
//! placeholder `i` always binds `execution_parameters()[i]`.

pub mod compiler;
pub mod filter;
pub mod join;
pub mod relation;
pub mod selection;
pub mod set_ops;
pub mod update;

pub use compiler::{
    CompiledStatement, QueryFactory, SqlQueryFactory, SqlSelection, TransactSqlQueryFactory,
};
pub use filter::{FilterKind, ValueFilter};
pub use join::JoinClause;
pub use relation::{EntityRelationSet, EntityRelationSetBuilder};
pub use selection::ItemSelection;
pub use set_ops::SetOpType;
pub use update::{Assignment, SqlUpdate};
