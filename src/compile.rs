//! Compile pipeline
//!
//! Loads the two specification documents and the snippet/template
//! registries, resolves calculated tables, checks every partition reference
//! up front and then writes the project. The first failure aborts the run;
//! files already written are left in place.

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::emitter::{emit_pbip, emit_report_stub, emit_semantic_model, ProjectLayout};
use crate::error::{CompileError, MissingReference};
use crate::parser;
use crate::registry::discovery::{resolve_dax_dirs, resolve_transform_dirs};
use crate::registry::{load_dax_templates, load_transforms, TransformRegistry};
use crate::resolver::resolve_calculated_tables;
use crate::semantic_model::{ModelBody, SourcesSpec};

/// Inputs of one compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub model_path: PathBuf,
    pub sources_path: PathBuf,
    pub out_dir: PathBuf,
    /// Extra snippet directories, above the global and environment ones
    pub transform_dirs: Vec<PathBuf>,
    /// Extra DAX template directories, below `<model dir>/dax`
    pub dax_dirs: Vec<PathBuf>,
    pub stub_report: bool,
}

impl CompileOptions {
    pub fn new(
        model_path: impl Into<PathBuf>,
        sources_path: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        CompileOptions {
            model_path: model_path.into(),
            sources_path: sources_path.into(),
            out_dir: out_dir.into(),
            transform_dirs: Vec::new(),
            dax_dirs: Vec::new(),
            stub_report: true,
        }
    }

    /// Directory holding the model file, used for convention directories
    pub fn project_root(&self) -> PathBuf {
        match self.model_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// What a successful compilation produced
#[derive(Debug, Clone)]
pub struct CompileSummary {
    pub model_name: String,
    pub semantic_model_dir: PathBuf,
    pub pbip_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub tables: usize,
    pub relationships: usize,
    pub transforms_loaded: usize,
    pub dax_templates_loaded: usize,
    pub files_written: Vec<PathBuf>,
}

/// Collect every unknown source key and snippet name in the model
pub fn check_references(
    model: &ModelBody,
    sources: &SourcesSpec,
    registry: &TransformRegistry,
) -> Result<(), CompileError> {
    let mut missing_sources = Vec::new();
    let mut missing_transforms = Vec::new();

    for table in &model.tables {
        for partition in &table.partitions {
            let reference = |name: &str| MissingReference {
                table: table.name.clone(),
                partition: partition.name.clone(),
                name: name.to_string(),
            };
            if let Some(key) = partition.source_key() {
                if sources.get(key).is_none() {
                    missing_sources.push(reference(key));
                }
            }
            for step in &partition.custom_steps {
                if registry.contains(&step.name) {
                    continue;
                }
                let missing = reference(&step.name);
                if !missing_transforms.contains(&missing) {
                    missing_transforms.push(missing);
                }
            }
        }
    }

    if missing_sources.is_empty() && missing_transforms.is_empty() {
        Ok(())
    } else {
        Err(CompileError::MissingReferences {
            sources: missing_sources,
            transforms: missing_transforms,
        })
    }
}

/// Compile the model described by `options` into a Power BI Project
pub fn compile_project(options: &CompileOptions) -> Result<CompileSummary, CompileError> {
    info!(sources = %options.sources_path.display(), "Loading sources");
    let sources = parser::parse_sources_file(&options.sources_path)?;
    debug!(count = sources.sources.len(), "Sources loaded");

    info!(model = %options.model_path.display(), "Loading model");
    let spec = parser::parse_model_file(&options.model_path)?;
    let mut model = spec.model;

    let project_root = options.project_root();
    let transform_dirs = resolve_transform_dirs(&project_root, &options.transform_dirs);
    let dax_dirs = resolve_dax_dirs(&project_root, &options.dax_dirs);
    debug!(?transform_dirs, ?dax_dirs, "Resolved registry directories");

    let registry = load_transforms(&transform_dirs)?;
    let templates = load_dax_templates(&dax_dirs)?;
    info!(
        transforms = registry.len(),
        dax_templates = templates.len(),
        "Registries loaded"
    );
    debug!(transforms = ?registry.names().collect::<Vec<_>>(), "Available transforms");

    resolve_calculated_tables(&mut model, &templates)?;
    check_references(&model, &sources, &registry)?;

    let layout = ProjectLayout::new(&options.out_dir, &model.name);
    info!(model = %model.name, out = %layout.root().display(), "Emitting semantic model");
    let mut files_written = emit_semantic_model(&layout, &model, &sources, &registry)?;

    let report_path = if options.stub_report {
        let path = emit_report_stub(&layout)?;
        files_written.push(path.clone());
        Some(path)
    } else {
        None
    };
    let pbip_path = emit_pbip(&layout, report_path.is_some())?;
    files_written.push(pbip_path.clone());

    info!(model = %model.name, files = files_written.len(), "Compilation finished");
    Ok(CompileSummary {
        model_name: model.name.clone(),
        semantic_model_dir: layout.semantic_model_dir(),
        pbip_path,
        report_path,
        tables: model.tables.len(),
        relationships: model.relationships.len(),
        transforms_loaded: registry.len(),
        dax_templates_loaded: templates.len(),
        files_written,
    })
}

/// Compile with the model and sources files found in `dir`
pub fn compile_dir(dir: &Path, out_dir: &Path) -> Result<CompileSummary, CompileError> {
    compile_project(&CompileOptions::new(
        dir.join("model.yaml"),
        dir.join("sources.yaml"),
        out_dir,
    ))
}
