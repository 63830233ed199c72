//! Error types for pbipgen

use std::fmt;
use crate::emitter::EmitError;
use crate::registry::RegistryError;
use crate::resolver::ResolveError;

/// Errors that can occur while loading specification documents
#[derive(Debug)]
pub enum ParseError {
    /// IO error reading file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// YAML deserialization error (structural validation failures surface here too)
    Yaml {
        source: serde_yaml::Error,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io { path, source } => {
                write!(f, "Failed to read '{}': {}", path, source)
            }
            ParseError::Yaml { source } => {
                write!(f, "Invalid specification: {}", source)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io { source, .. } => Some(source),
            ParseError::Yaml { source } => Some(source),
        }
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        ParseError::Yaml { source: err }
    }
}

/// A structurally invalid specification.
///
/// Raised while constructing the typed model, so it names the offending
/// table / partition / field in `context`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub context: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.context, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A partition reference that does not resolve, found by the model-wide check
#[derive(Debug, Clone, PartialEq)]
pub struct MissingReference {
    pub table: String,
    pub partition: String,
    pub name: String,
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (table '{}', partition '{}')", self.name, self.table, self.partition)
    }
}

/// Errors that can occur while compiling a project
#[derive(Debug)]
pub enum CompileError {
    Parse(ParseError),
    Registry(RegistryError),
    Resolve(ResolveError),
    Emit(EmitError),
    /// Unknown source keys and snippet names across the whole model
    MissingReferences {
        sources: Vec<MissingReference>,
        transforms: Vec<MissingReference>,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(err) => write!(f, "{}", err),
            CompileError::Registry(err) => write!(f, "{}", err),
            CompileError::Resolve(err) => write!(f, "{}", err),
            CompileError::Emit(err) => write!(f, "{}", err),
            CompileError::MissingReferences { sources, transforms } => {
                let mut parts = Vec::new();
                if !sources.is_empty() {
                    let listed: Vec<String> = sources.iter().map(ToString::to_string).collect();
                    parts.push(format!("unknown sources: {}", listed.join(", ")));
                }
                if !transforms.is_empty() {
                    let listed: Vec<String> = transforms.iter().map(ToString::to_string).collect();
                    parts.push(format!("unknown transforms: {}", listed.join(", ")));
                }
                write!(f, "Unresolved references; {}", parts.join("; "))
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(err) => Some(err),
            CompileError::Registry(err) => Some(err),
            CompileError::Resolve(err) => Some(err),
            CompileError::Emit(err) => Some(err),
            CompileError::MissingReferences { .. } => None,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<RegistryError> for CompileError {
    fn from(err: RegistryError) -> Self {
        CompileError::Registry(err)
    }
}

impl From<ResolveError> for CompileError {
    fn from(err: ResolveError) -> Self {
        CompileError::Resolve(err)
    }
}

impl From<EmitError> for CompileError {
    fn from(err: EmitError) -> Self {
        CompileError::Emit(err)
    }
}
