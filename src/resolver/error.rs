use std::fmt;

/// Errors that can occur while resolving calculated tables
#[derive(Debug)]
pub enum ResolveError {
    /// Calculated tables reference DAX templates that were not loaded,
    /// as `(table, template)` pairs
    MissingTemplates(Vec<(String, String)>),
    /// A declared `sourceLineage` is malformed or names an unknown table
    InvalidLineage {
        table: String,
        column: String,
        lineage: String,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingTemplates(missing) => {
                let listed: Vec<String> = missing
                    .iter()
                    .map(|(table, template)| format!("'{}' (table '{}')", template, table))
                    .collect();
                write!(f, "Unknown DAX templates: {}", listed.join(", "))
            }
            ResolveError::InvalidLineage { table, column, lineage } => {
                write!(
                    f,
                    "Column '{}' in table '{}' has invalid sourceLineage '{}', expected Table[Column] of a model table",
                    column, table, lineage
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}
