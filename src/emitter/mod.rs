//! Definition file emitter (verb module)
//!
//! Renders the validated model as TMDL and writes the Power BI Project
//! layout with its JSON descriptors.

mod error;
mod project;
pub mod tmdl;

pub use error::EmitError;
pub use project::{emit_pbip, emit_report_stub, emit_semantic_model, ProjectLayout};
