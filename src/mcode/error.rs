//! Partition code builder errors

use std::fmt;
use crate::semantic_model::SourceKind;

#[derive(Debug)]
pub enum BuildError {
    /// Partition references a source key that is not declared
    UnknownSource {
        partition: String,
        table: String,
        source: String,
    },
    /// One or more custom steps name snippets that were not loaded
    UnknownTransforms {
        partition: String,
        table: String,
        names: Vec<String>,
    },
    /// A database-scoped operation has no database from any signal
    MissingDatabase {
        partition: String,
        source: String,
    },
    /// Navigation or a native query was requested on a file-based source
    UnsupportedNavigation {
        source: String,
        kind: SourceKind,
    },
    /// Arguments missing for a higher-order snippet, or given to a table snippet
    TransformArguments {
        partition: String,
        transform: String,
        message: String,
    },
    /// `build` was reached without any stage binding a value
    NoSeed {
        partition: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownSource { partition, table, source } => {
                write!(
                    f,
                    "Partition '{}' in table '{}' references unknown source '{}'",
                    partition, table, source
                )
            }
            BuildError::UnknownTransforms { partition, table, names } => {
                write!(
                    f,
                    "Partition '{}' in table '{}' references unknown transforms: [{}]",
                    partition,
                    table,
                    names.join(", ")
                )
            }
            BuildError::MissingDatabase { partition, source } => {
                write!(
                    f,
                    "Partition '{}' needs a database but source '{}' declares none and the partition does not name one",
                    partition, source
                )
            }
            BuildError::UnsupportedNavigation { source, kind } => {
                write!(
                    f,
                    "Source '{}' is a {} source and cannot be navigated or queried",
                    source, kind
                )
            }
            BuildError::TransformArguments { partition, transform, message } => {
                write!(
                    f,
                    "Transform '{}' in partition '{}': {}",
                    transform, partition, message
                )
            }
            BuildError::NoSeed { partition } => {
                write!(f, "No data source configured for partition '{}'", partition)
            }
        }
    }
}

impl std::error::Error for BuildError {}
