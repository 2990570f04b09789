//! Table-valued INSERT and MERGE for sqlentity.
//!
//! A structure type declares a user-defined table type and mirrors its
//! columns. A batch of structure values becomes one [`StructuredPayload`]
//! bound as a single parameter, and the command text inserts or merges the
//! whole batch in one round trip. Structure columns are matched to target
//! columns by physical name; columns the target does not have are carried
//! through to the optional result set.

pub mod command;
pub mod insert;
pub mod merge;

pub use command::{StructuredCommand, StructuredPayload};
pub use insert::StructuredInsertCommand;
pub use merge::StructuredMergeCommand;
