//! Data source definitions (the sources document)

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use crate::error::ValidationError;

/// The closed set of supported connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Warehouse-style SQL source
    Snowflake,
    /// Warehouse-style SQL source
    SqlServer,
    /// File-based source
    Excel,
    /// File-based source
    Csv,
}

impl SourceKind {
    /// Whether the connector exposes a database collection that can be navigated
    pub fn is_warehouse(&self) -> bool {
        matches!(self, SourceKind::Snowflake | SourceKind::SqlServer)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Snowflake => write!(f, "snowflake"),
            SourceKind::SqlServer => write!(f, "sqlserver"),
            SourceKind::Excel => write!(f, "excel"),
            SourceKind::Csv => write!(f, "csv"),
        }
    }
}

/// Connector options. Known keys are typed, the rest is an open bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceOptions {
    pub implementation: Option<String>,
    #[serde(rename = "queryTag")]
    pub query_tag: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SourceOptions {
    /// Look up an extra option as text
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceDef {
    kind: SourceKind,
    server: Option<String>,
    warehouse: Option<String>,
    database: Option<String>,
    role: Option<String>,
    file_path: Option<String>,
    workbook_name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    options: SourceOptions,
}

/// A named external data connection
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "SourceDef")]
pub struct Source {
    pub kind: SourceKind,
    pub server: Option<String>,
    pub warehouse: Option<String>,
    /// Default database
    pub database: Option<String>,
    pub role: Option<String>,
    pub file_path: Option<String>,
    pub workbook_name: Option<String>,
    pub description: Option<String>,
    pub options: SourceOptions,
}

impl TryFrom<SourceDef> for Source {
    type Error = ValidationError;

    fn try_from(def: SourceDef) -> Result<Self, Self::Error> {
        let context = format!("{} source", def.kind);
        let require = |field: &Option<String>, name: &str| -> Result<(), ValidationError> {
            match field.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(()),
                _ => Err(ValidationError::new(&context, format!("'{}' is required", name))),
            }
        };

        match def.kind {
            SourceKind::Snowflake | SourceKind::SqlServer => require(&def.server, "server")?,
            SourceKind::Excel => {
                require(&def.file_path, "file_path")?;
                require(&def.workbook_name, "workbook_name")?;
            }
            SourceKind::Csv => require(&def.file_path, "file_path")?,
        }

        Ok(Source {
            kind: def.kind,
            server: def.server,
            warehouse: def.warehouse,
            database: def.database.filter(|d| !d.trim().is_empty()),
            role: def.role,
            file_path: def.file_path,
            workbook_name: def.workbook_name,
            description: def.description,
            options: def.options,
        })
    }
}

impl Source {
    /// Minimal warehouse source, handy for tests and programmatic models
    pub fn snowflake(server: impl Into<String>, warehouse: Option<&str>, database: Option<&str>) -> Self {
        Source {
            kind: SourceKind::Snowflake,
            server: Some(server.into()),
            warehouse: warehouse.map(str::to_string),
            database: database.map(str::to_string),
            role: None,
            file_path: None,
            workbook_name: None,
            description: None,
            options: SourceOptions::default(),
        }
    }
}

/// Top-level sources document
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSpec {
    #[serde(default = "default_version")]
    pub version: u32,
    pub sources: BTreeMap<String, Source>,
}

fn default_version() -> u32 {
    1
}

impl SourcesSpec {
    pub fn get(&self, key: &str) -> Option<&Source> {
        self.sources.get(key)
    }
}
