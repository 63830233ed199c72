//! Calculated table resolver (verb module)
//!
//! Post-validation pass over the model: substitutes DAX templates into
//! calculated tables, then enriches their columns with source lineage and
//! aggregation hints.

mod error;
mod resolve;

pub use error::ResolveError;
pub use resolve::{column_references, resolve_calculated_tables};
