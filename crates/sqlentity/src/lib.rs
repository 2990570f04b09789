//! sqlentity - entity definitions resolved into SQL and back.
//!
//! sqlentity provides:
//!
//! - A const schema registry: entity types describe their table, keys,
//!   columns and nested relations through a static [`EntityDescriptor`]
//! - Resolution of those declarations into flattened, alias-aware attribute
//!   catalogs ([`EntityDefinition`])
//! - Compilation of selections into parameterized SELECT, CONTAINS, DELETE
//!   and UPDATE statements
//! - Table-valued INSERT and MERGE of whole batches
//! - Materialization of joined rows back into nested entity graphs
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlentity::prelude::*;
//!
//! struct Hero;
//!
//! impl Hero {
//!     const AGE: Attr<Hero> = Attr::new("Age");
//! }
//!
//! impl Entity for Hero {
//!     fn descriptor() -> &'static EntityDescriptor {
//!         static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
//!             "Hero",
//!             &[
//!                 AttributeInfo::column("HeroId"),
//!                 AttributeInfo::column("Name"),
//!                 AttributeInfo::column("Age"),
//!             ],
//!         )
//!         .primary_key(&["HeroId"])
//!         .auto_increment();
//!         &DESCRIPTOR
//!     }
//! }
//!
//! let selection = ItemSelection::<Hero>::new()?.where_range(Hero::AGE, Some(18), None)?;
//! let statement = SqlSelection::new(selection);
//! // SELECT [dbo].[Hero].[HeroId], [dbo].[Hero].[Name], [dbo].[Hero].[Age]
//! // FROM [dbo].[Hero]
//! // WHERE [dbo].[Hero].[Age] >= @0
//! println!("{}", statement.execution_statement());
//! ```

pub use sqlentity_core::{
    ArgumentError, Attr, AttributeInfo, AttributeSource, BusinessError, ColumnInfo,
    DeclarationError, DeclarationErrorKind, DescriptorFn, Entity, EntityAttributeDefinition,
    EntityAttributeTypes, EntityDefinition, EntityDefinitionProvider, EntityDescriptor,
    EntityLocation, EntityRelation, EntityValues, Error, FromValue, JoinType, LookupError,
    LookupErrorKind, NameQualifier, PostgreSqlQualifier, RecordReader, RelationInfo,
    ResolverConfig, Result, Row, TableTypeInfo, TransactSqlQualifier, TypeError, Value,
    definition_of,
};
pub use sqlentity_materialize::{
    BindingPlan, EntityRecord, FieldBinding, FromRecord, KeyValues, MaterializationScope,
    PlanNode, PocoDataRequest, RaisedPocoFactory, RecordData, RecordGraph, materialize,
};
pub use sqlentity_query::{
    Assignment, CompiledStatement, EntityRelationSet, EntityRelationSetBuilder, FilterKind,
    ItemSelection, JoinClause, QueryFactory, SetOpType, SqlQueryFactory, SqlSelection, SqlUpdate,
    TransactSqlQueryFactory, ValueFilter,
};
pub use sqlentity_structured::{
    StructuredCommand, StructuredInsertCommand, StructuredMergeCommand, StructuredPayload,
};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Attr, AttributeInfo, Entity, EntityDescriptor, EntityRecord, EntityValues, Error,
        FromRecord, ItemSelection, PocoDataRequest, QueryFactory, RaisedPocoFactory, Result, Row,
        SqlSelection, SqlUpdate, StructuredInsertCommand, StructuredMergeCommand,
        TransactSqlQueryFactory, Value, definition_of,
    };
}
