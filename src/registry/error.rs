//! Registry error types

use std::fmt;

/// Errors that can occur while loading snippets and templates
#[derive(Debug)]
pub enum RegistryError {
    /// IO error reading a snippet or template file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Snippet text does not start with an accepted function signature
    InvalidSignature {
        path: String,
    },
    /// Directory traversal failed
    Walk {
        path: String,
        message: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Io { path, source } => {
                write!(f, "Failed to read '{}': {}", path, source)
            }
            RegistryError::InvalidSignature { path } => {
                write!(
                    f,
                    "Transform '{}' must start with '(t as table) as table =>', \
                     '(t as table) as table' followed by a let block, or '(x as <type>) as function'",
                    path
                )
            }
            RegistryError::Walk { path, message } => {
                write!(f, "Failed to scan directory '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
