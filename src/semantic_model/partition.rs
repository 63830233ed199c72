//! Partition definitions
//!
//! A partition is one materialization strategy for a table's rows. The raw
//! YAML shape is validated into [`PartitionSource`], which encodes the
//! mutually exclusive source-description modes.

use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMode {
    #[default]
    Import,
    #[serde(alias = "directQuery")]
    DirectQuery,
    /// Pass-through partition that references an existing entity
    Entity,
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionMode::Import => write!(f, "import"),
            PartitionMode::DirectQuery => write!(f, "directQuery"),
            PartitionMode::Entity => write!(f, "directLake"),
        }
    }
}

// ============================================================================
// Navigation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NavigationDef {
    /// `DB.SCHEMA.TABLE` or `SCHEMA.TABLE`
    Dotted(String),
    Mapping {
        database: Option<String>,
        schema: String,
        table: String,
    },
}

/// Database → schema → table target
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "NavigationDef")]
pub struct Navigation {
    pub database: Option<String>,
    pub schema: String,
    pub table: String,
}

impl Navigation {
    pub fn new(database: Option<&str>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Navigation {
            database: database.map(str::to_string),
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl std::str::FromStr for Navigation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ValidationError::new(
                "navigation",
                format!("'{}' has an empty component", s),
            ));
        }
        match parts.as_slice() {
            [db, schema, table] => Ok(Navigation::new(Some(db), *schema, *table)),
            [schema, table] => Ok(Navigation::new(None, *schema, *table)),
            _ => Err(ValidationError::new(
                "navigation",
                format!("'{}' must be DATABASE.SCHEMA.TABLE or SCHEMA.TABLE", s),
            )),
        }
    }
}

impl TryFrom<NavigationDef> for Navigation {
    type Error = ValidationError;

    fn try_from(def: NavigationDef) -> Result<Self, Self::Error> {
        match def {
            NavigationDef::Dotted(s) => s.parse(),
            NavigationDef::Mapping { database, schema, table } => Ok(Navigation {
                database: database.filter(|d| !d.trim().is_empty()),
                schema,
                table,
            }),
        }
    }
}

// ============================================================================
// Custom steps
// ============================================================================

/// Reference to a named transform snippet: `name` or `name(args)`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct CustomStep {
    pub name: String,
    /// Raw M argument text for higher-order snippets
    pub args: Option<String>,
}

fn step_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_]+)\s*(?:\((.*)\))?\s*$").expect("Invalid custom step regex")
    })
}

impl TryFrom<String> for CustomStep {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        let caps = step_regex().captures(trimmed).ok_or_else(|| {
            ValidationError::new(
                "custom_steps",
                format!("'{}' is not a transform name or name(args)", raw),
            )
        })?;
        let args = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|a| !a.is_empty());
        Ok(CustomStep {
            name: caps[1].to_string(),
            args,
        })
    }
}

// ============================================================================
// Partition
// ============================================================================

/// Identifiers of an existing entity referenced by a pass-through partition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub schema: Option<String>,
    #[serde(rename = "expressionSource")]
    pub expression_source: Option<String>,
}

/// Raw partition as written in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionDef {
    pub name: String,
    #[serde(default)]
    pub mode: PartitionMode,
    #[serde(rename = "use")]
    pub use_source: Option<String>,
    pub navigation: Option<Navigation>,
    #[serde(rename = "nativeQuery")]
    pub native_query: Option<String>,
    #[serde(default)]
    pub custom_steps: Vec<CustomStep>,
    pub entity: Option<EntityRef>,
}

/// The single source-description mode a partition uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSource {
    Navigation { source: String, navigation: Navigation },
    NativeQuery { source: String, query: String },
    /// Simple source (e.g. a file) loaded through its standard template
    Source { source: String },
    Entity(EntityRef),
}

/// A validated partition
#[derive(Debug, Clone)]
pub struct Partition {
    pub name: String,
    pub mode: PartitionMode,
    pub source: PartitionSource,
    pub custom_steps: Vec<CustomStep>,
}

impl Partition {
    /// Validate a raw partition. `table_source` is the table-level `source.use`
    /// fallback.
    pub fn from_def(
        def: PartitionDef,
        table: &str,
        table_source: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let context = format!("partition '{}' in table '{}'", def.name, table);
        let native_query = def.native_query.filter(|q| !q.trim().is_empty());
        let is_entity = def.mode == PartitionMode::Entity || def.entity.is_some();

        let source = if is_entity {
            if def.navigation.is_some() || native_query.is_some() {
                return Err(ValidationError::new(
                    &context,
                    "entity partitions must not declare navigation or nativeQuery",
                ));
            }
            if def.use_source.is_some() {
                return Err(ValidationError::new(&context, "entity partitions must not reference a source"));
            }
            if !def.custom_steps.is_empty() {
                return Err(ValidationError::new(&context, "entity partitions do not run custom_steps"));
            }
            if def.mode != PartitionMode::Entity {
                return Err(ValidationError::new(&context, "an entity block requires mode: entity"));
            }
            let entity = def
                .entity
                .filter(|e| !e.name.trim().is_empty())
                .ok_or_else(|| ValidationError::new(&context, "entity partitions require entity.name"))?;
            PartitionSource::Entity(entity)
        } else {
            let source = def
                .use_source
                .as_deref()
                .or(table_source)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ValidationError::new(&context, "no source specified ('use')"))?;

            match (def.navigation, native_query) {
                (Some(_), Some(_)) => {
                    return Err(ValidationError::new(
                        &context,
                        "navigation and nativeQuery are mutually exclusive",
                    ))
                }
                (Some(navigation), None) => PartitionSource::Navigation { source, navigation },
                (None, Some(query)) => PartitionSource::NativeQuery { source, query },
                (None, None) => PartitionSource::Source { source },
            }
        };

        Ok(Partition {
            name: def.name,
            mode: def.mode,
            source,
            custom_steps: def.custom_steps,
        })
    }

    /// Source key, absent for entity partitions
    pub fn source_key(&self) -> Option<&str> {
        match &self.source {
            PartitionSource::Navigation { source, .. }
            | PartitionSource::NativeQuery { source, .. }
            | PartitionSource::Source { source } => Some(source),
            PartitionSource::Entity(_) => None,
        }
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        match &self.source {
            PartitionSource::Navigation { navigation, .. } => Some(navigation),
            _ => None,
        }
    }

    pub fn native_query(&self) -> Option<&str> {
        match &self.source {
            PartitionSource::NativeQuery { query, .. } => Some(query),
            _ => None,
        }
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        match &self.source {
            PartitionSource::Entity(e) => Some(e),
            _ => None,
        }
    }
}
