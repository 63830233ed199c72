//! Root model document

use serde::Deserialize;
use std::collections::HashSet;
use super::relationship::{Relationship, RelationshipDef};
use super::table::Table;
use crate::error::ValidationError;

/// The root model document
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpec {
    #[serde(default = "default_version")]
    pub version: u32,
    pub model: ModelBody,
}

fn default_version() -> u32 {
    1
}

fn default_culture() -> String {
    "en-US".to_string()
}

fn default_compatibility_level() -> u32 {
    1567
}

#[derive(Debug, Deserialize)]
struct ModelBodyDef {
    name: String,
    #[serde(default = "default_culture")]
    culture: String,
    #[serde(rename = "compatibilityLevel", default = "default_compatibility_level")]
    compatibility_level: u32,
    description: Option<String>,
    tables: Vec<Table>,
    #[serde(default)]
    relationships: Vec<RelationshipDef>,
}

/// A semantic model: tables plus the relationships between them
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "ModelBodyDef")]
pub struct ModelBody {
    pub name: String,
    pub culture: String,
    pub compatibility_level: u32,
    pub description: Option<String>,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl TryFrom<ModelBodyDef> for ModelBody {
    type Error = ValidationError;

    fn try_from(def: ModelBodyDef) -> Result<Self, Self::Error> {
        let context = format!("model '{}'", def.name);
        if def.name.trim().is_empty() {
            return Err(ValidationError::new("model", "name must not be empty"));
        }

        let mut seen = HashSet::new();
        for table in &def.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(ValidationError::new(
                    &context,
                    format!("duplicate table name '{}'", table.name),
                ));
            }
        }

        let tables = def.tables;
        let columns_of = |name: &str| {
            tables
                .iter()
                .find(|t| t.name == name)
                .map(|t| t.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>())
        };
        let relationships = def
            .relationships
            .into_iter()
            .map(|r| Relationship::resolve(r, columns_of))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ModelBody {
            name: def.name,
            culture: def.culture,
            compatibility_level: def.compatibility_level,
            description: def.description,
            tables,
            relationships,
        })
    }
}

impl ModelBody {
    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}
