//! Emitter errors

use std::fmt;
use crate::mcode::BuildError;

#[derive(Debug)]
pub enum EmitError {
    /// Failed to create a directory or write a file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Partition code generation failed
    Build(BuildError),
    /// JSON descriptor serialization failed
    Json(serde_json::Error),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::Io { path, source } => {
                write!(f, "Failed to write '{}': {}", path, source)
            }
            EmitError::Build(err) => write!(f, "{}", err),
            EmitError::Json(err) => write!(f, "Failed to serialize descriptor: {}", err),
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EmitError::Io { source, .. } => Some(source),
            EmitError::Build(err) => Some(err),
            EmitError::Json(err) => Some(err),
        }
    }
}

impl From<BuildError> for EmitError {
    fn from(err: BuildError) -> Self {
        EmitError::Build(err)
    }
}

impl From<serde_json::Error> for EmitError {
    fn from(err: serde_json::Error) -> Self {
        EmitError::Json(err)
    }
}
