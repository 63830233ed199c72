//! Semantic model types (nouns)
//!
//! These types represent the parsed and validated model and sources
//! documents. Structural invariants are enforced while deserializing, so
//! every value reachable from a [`ModelSpec`] is well formed.

mod column;
mod measure;
mod partition;
mod relationship;
mod schema;
mod source;
mod table;
mod types;

pub use column::Column;
pub use measure::{BaseMeasures, Measure};
pub use partition::{CustomStep, EntityRef, Navigation, Partition, PartitionDef, PartitionMode, PartitionSource};
pub use relationship::{ColumnRef, Endpoint, Relationship, RelationshipDef};
pub use schema::{ModelBody, ModelSpec};
pub use source::{Source, SourceKind, SourceOptions, SourcesSpec};
pub use table::{CalculatedTableDef, CalculationItem, FieldParameterDef, FieldParameterEntry, Table, TableKind};
pub use types::{Aggregation, Cardinality, ColumnPolicy, CrossFilter, DataType, SummarizeBy};
