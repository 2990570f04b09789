//! Core types for sqlentity.
//!
//! This crate provides the foundations every other sqlentity crate builds on:
//!
//! - `Entity` and `EntityDescriptor`, the static schema declarations
//! - `EntityDefinitionProvider`, which resolves declarations into a
//!   flattened, alias-aware attribute catalog
//! - `NameQualifier`, the dialect boundary for quoting and placeholders
//! - `Value`, `Row` and `RecordReader` for parameters and result rows

pub mod attribute;
pub mod config;
pub mod definition;
pub mod entity;
pub mod error;
pub mod location;
pub mod qualifier;
pub mod relation;
pub mod row;
pub mod value;

pub use attribute::{Attr, EntityAttributeDefinition, EntityAttributeTypes};
pub use config::ResolverConfig;
pub use definition::{EntityDefinition, EntityDefinitionProvider, definition_of};
pub use entity::{
    AttributeInfo, AttributeSource, DescriptorFn, Entity, EntityDescriptor, EntityValues,
    JoinType, RelationInfo, TableTypeInfo,
};
pub use error::{
    ArgumentError, BusinessError, DeclarationError, DeclarationErrorKind, Error, LookupError,
    LookupErrorKind, Result, TypeError,
};
pub use location::EntityLocation;
pub use qualifier::{NameQualifier, PostgreSqlQualifier, TransactSqlQualifier};
pub use relation::EntityRelation;
pub use row::{ColumnInfo, FromValue, RecordReader, Row};
pub use value::Value;
