//! pbipgen - Compile YAML data-model specifications to Power BI Projects
//!
//! This library provides:
//! - Specification types (sources, tables, columns, measures, partitions, relationships)
//! - Specification parsing from YAML
//! - Snippet and DAX template registries with directory precedence
//! - Power Query M partition code generation
//! - Calculated table resolution (templates, lineage)
//! - TMDL emission and project layout
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `semantic_model/` - sources, tables, partitions, relationships
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → ModelSpec / SourcesSpec
//! - `registry/` - directories → TransformRegistry / DaxTemplates
//! - `mcode/` - Table + Partition + Sources → M expression
//! - `resolver/` - ModelBody + DaxTemplates → resolved calculated tables
//! - `emitter/` - ModelBody → TMDL files and project layout
//! - `compile` - the whole pipeline
//!
//! # Example
//!
//! ```ignore
//! use pbipgen::{compile_project, CompileOptions};
//!
//! let mut options = CompileOptions::new("model.yaml", "sources.yaml", "out");
//! options.transform_dirs.push("shared/transforms".into());
//! let summary = compile_project(&options)?;
//! println!("{} tables -> {}", summary.tables, summary.pbip_path.display());
//! ```

pub mod semantic_model;
pub mod parser;
pub mod registry;
pub mod mcode;
pub mod resolver;
pub mod emitter;
pub mod compile;
pub mod error;

// Re-export commonly used types
pub use semantic_model::{
    ColumnPolicy, DataType, ModelBody, ModelSpec, Partition, PartitionMode, Source, SourceKind,
    SourcesSpec, Table, TableKind,
};
pub use registry::{DaxTemplates, RegistryError, TransformRegistry};
pub use mcode::{generate_partition_mcode, BuildError, PartitionBuilder};
pub use resolver::{resolve_calculated_tables, ResolveError};
pub use emitter::{EmitError, ProjectLayout};
pub use compile::{compile_dir, compile_project, CompileOptions, CompileSummary};
pub use error::{CompileError, ParseError, ValidationError};
