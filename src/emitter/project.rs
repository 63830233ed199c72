//! Project layout writer
//!
//! ```text
//! <out>/<Model>.pbip
//! <out>/<Model>.SemanticModel/definition.pbism
//! <out>/<Model>.SemanticModel/definition/{database,model,expressions,relationships}.tmdl
//! <out>/<Model>.SemanticModel/definition/cultures/<culture>.tmdl
//! <out>/<Model>.SemanticModel/definition/tables/<Table>.tmdl
//! <out>/<Model>.Report/definition.pbir
//! ```

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use super::error::EmitError;
use super::tmdl;
use crate::mcode::generate_partition_mcode;
use crate::mcode::source::standard_template;
use crate::registry::TransformRegistry;
use crate::semantic_model::{ModelBody, SourcesSpec, Table, TableKind};

const PBIP_SCHEMA: &str =
    "https://developer.microsoft.com/json-schemas/fabric/pbip/pbipProperties/1.0.0/schema.json";

/// Paths of one compiled project
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    model_name: String,
}

impl ProjectLayout {
    pub fn new(out_dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        ProjectLayout {
            root: out_dir.into(),
            model_name: model_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pbip_path(&self) -> PathBuf {
        self.root.join(format!("{}.pbip", self.model_name))
    }

    pub fn semantic_model_dir(&self) -> PathBuf {
        self.root.join(format!("{}.SemanticModel", self.model_name))
    }

    pub fn definition_dir(&self) -> PathBuf {
        self.semantic_model_dir().join("definition")
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.definition_dir().join("tables")
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join(format!("{}.Report", self.model_name))
    }

    /// File for a table, with path separators replaced
    pub fn table_path(&self, table: &str) -> PathBuf {
        let file: String = table
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.tables_dir().join(format!("{}.tmdl", file))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), EmitError> {
    let io_err = |source| EmitError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}

/// Generated M for the table's first partition, if it goes through the builder
fn partition_code(
    table: &Table,
    sources: &SourcesSpec,
    registry: &TransformRegistry,
) -> Result<Option<String>, EmitError> {
    if table.kind != TableKind::Table {
        return Ok(None);
    }
    match table.primary_partition() {
        Some(partition) if partition.entity().is_none() => {
            Ok(Some(generate_partition_mcode(table, partition, sources, registry)?))
        }
        _ => Ok(None),
    }
}

/// Write the semantic model definition, returning the written files
pub fn emit_semantic_model(
    layout: &ProjectLayout,
    model: &ModelBody,
    sources: &SourcesSpec,
    registry: &TransformRegistry,
) -> Result<Vec<PathBuf>, EmitError> {
    let mut written = Vec::new();
    let mut emit = |path: PathBuf, contents: String| -> Result<(), EmitError> {
        write_file(&path, &contents)?;
        written.push(path);
        Ok(())
    };

    let pbism = json!({ "version": "1.0", "type": "pbi-semantic-model" });
    emit(
        layout.semantic_model_dir().join("definition.pbism"),
        serde_json::to_string_pretty(&pbism)?,
    )?;

    let definition = layout.definition_dir();
    emit(definition.join("database.tmdl"), tmdl::emit_database(model))?;
    emit(definition.join("model.tmdl"), tmdl::emit_model(model))?;

    let expressions = sources
        .sources
        .iter()
        .map(|(key, source)| standard_template(source, key).map(|m| (key.clone(), m)))
        .collect::<Result<Vec<_>, _>>()?;
    emit(definition.join("expressions.tmdl"), tmdl::emit_expressions(&expressions))?;

    if !model.relationships.is_empty() {
        emit(
            definition.join("relationships.tmdl"),
            tmdl::emit_relationships(&model.relationships),
        )?;
    }

    emit(
        definition.join("cultures").join(format!("{}.tmdl", model.culture)),
        tmdl::emit_culture(model),
    )?;

    for table in &model.tables {
        let code = partition_code(table, sources, registry)?;
        emit(layout.table_path(&table.name), tmdl::emit_table(table, code.as_deref()))?;
    }

    Ok(written)
}

/// Write a report that binds to the semantic model by relative path
pub fn emit_report_stub(layout: &ProjectLayout) -> Result<PathBuf, EmitError> {
    let pbir = json!({
        "version": "1.0",
        "datasetReference": {
            "byPath": { "path": format!("../{}.SemanticModel", layout.model_name) }
        }
    });
    let path = layout.report_dir().join("definition.pbir");
    write_file(&path, &serde_json::to_string_pretty(&pbir)?)?;
    Ok(path)
}

/// Write the `.pbip` entry point; the report artifact is listed only when a
/// report was written
pub fn emit_pbip(layout: &ProjectLayout, with_report: bool) -> Result<PathBuf, EmitError> {
    let artifacts = if with_report {
        json!([{ "report": { "path": format!("{}.Report", layout.model_name) } }])
    } else {
        json!([])
    };
    let pbip = json!({
        "$schema": PBIP_SCHEMA,
        "version": "1.0",
        "artifacts": artifacts,
        "settings": { "enableAutoRecovery": true }
    });
    let path = layout.pbip_path();
    write_file(&path, &serde_json::to_string_pretty(&pbip)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/out", "Sales");
        assert_eq!(layout.pbip_path(), PathBuf::from("/out/Sales.pbip"));
        assert_eq!(
            layout.definition_dir(),
            PathBuf::from("/out/Sales.SemanticModel/definition")
        );
        assert_eq!(
            layout.table_path("Fact/Sales"),
            PathBuf::from("/out/Sales.SemanticModel/definition/tables/Fact_Sales.tmdl")
        );
        assert_eq!(layout.report_dir(), PathBuf::from("/out/Sales.Report"));
    }

    #[test]
    fn test_pbip_and_report_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path(), "Sales");

        let pbir = emit_report_stub(&layout).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(pbir).unwrap()).unwrap();
        assert_eq!(value["datasetReference"]["byPath"]["path"], "../Sales.SemanticModel");

        let pbip = emit_pbip(&layout, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&pbip).unwrap()).unwrap();
        assert_eq!(value["artifacts"][0]["report"]["path"], "Sales.Report");

        emit_pbip(&layout, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&pbip).unwrap()).unwrap();
        assert_eq!(value["artifacts"].as_array().map(Vec::len), Some(0));
    }
}
