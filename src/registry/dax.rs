//! DAX formula templates for calculated tables

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use super::error::RegistryError;
use super::load_with_precedence;

/// Name → DAX body mapping. Bodies are used verbatim.
#[derive(Debug, Clone, Default)]
pub struct DaxTemplates {
    templates: BTreeMap<String, String>,
}

impl DaxTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Load `.dax` templates from `dirs`, later directories winning
pub fn load_dax_templates(dirs: &[PathBuf]) -> Result<DaxTemplates, RegistryError> {
    let templates = load_with_precedence(dirs, &["dax"], "DAX template", |_, _, text| Ok(text))?;
    info!("Loaded {} DAX template(s)", templates.len());
    Ok(DaxTemplates { templates })
}
