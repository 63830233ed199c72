//! Partition code builder
//!
//! A fresh [`PartitionBuilder`] is created per partition. Each stage appends
//! zero or more bindings and may advance the seed, the name of the most
//! recently bound value. Stages must run in this order:
//!
//! ```ignore
//! let m = PartitionBuilder::new(table, partition, &sources)
//!     .add_source_connection()?
//!     .add_navigation()
//!     .add_native_query()
//!     .add_column_selection()
//!     .add_type_transformation()
//!     .add_custom_transforms(&registry)?
//!     .build()?;
//! ```

use std::collections::HashSet;
use tracing::{debug, warn};
use super::error::BuildError;
use super::lexer::{escape_text, quote, strip_trailing_line_comment, substitute_identifier};
use super::source::{parse_template, resolve_database, standard_template, DATABASE_VAR};
use super::{dedent, Binding};
use crate::registry::{SnippetKind, TransformRegistry};
use crate::semantic_model::{
    ColumnPolicy, CustomStep, Partition, PartitionMode, PartitionSource, Source, SourcesSpec, Table,
};

const SCHEMA_VAR: &str = "SCH";
const TABLE_VAR: &str = "TBL";
const QUERY_VAR: &str = "Result";
const SELECTED_VAR: &str = "Selected";
const TYPED_VAR: &str = "Typed";

/// Incremental builder for one partition's M expression
#[derive(Debug)]
pub struct PartitionBuilder<'a> {
    table: &'a Table,
    partition: &'a Partition,
    sources: &'a SourcesSpec,
    bindings: Vec<Binding>,
    seed: Option<String>,
}

impl<'a> PartitionBuilder<'a> {
    pub fn new(table: &'a Table, partition: &'a Partition, sources: &'a SourcesSpec) -> Self {
        PartitionBuilder {
            table,
            partition,
            sources,
            bindings: Vec::new(),
            seed: None,
        }
    }

    /// Name of the most recently bound value
    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn lookup_source(&self, key: &str) -> Result<&'a Source, BuildError> {
        self.sources.get(key).ok_or_else(|| BuildError::UnknownSource {
            partition: self.partition.name.clone(),
            table: self.table.name.clone(),
            source: key.to_string(),
        })
    }

    fn bind(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        let binding = Binding::new(name, expr);
        self.seed = Some(binding.name.clone());
        self.bindings.push(binding);
    }

    /// Stage 1: database scope for navigation and native queries, or the
    /// source's standard template for simple sources. Entity partitions
    /// bind nothing.
    pub fn add_source_connection(mut self) -> Result<Self, BuildError> {
        let partition = self.partition;
        match &partition.source {
            PartitionSource::Navigation { source, navigation } => {
                let resolved = self.lookup_source(source)?;
                let bindings = resolve_database(
                    resolved,
                    source,
                    &partition.name,
                    navigation.database.as_deref(),
                )?;
                for b in bindings {
                    self.bind(b.name, b.expr);
                }
            }
            PartitionSource::NativeQuery { source, .. } => {
                let resolved = self.lookup_source(source)?;
                let bindings = resolve_database(resolved, source, &partition.name, None)?;
                for b in bindings {
                    self.bind(b.name, b.expr);
                }
            }
            PartitionSource::Source { source } => {
                let resolved = self.lookup_source(source)?;
                let template = standard_template(resolved, source)?;
                let (bindings, result) = parse_template(&template);
                for b in bindings {
                    self.bind(b.name, b.expr);
                }
                if result.is_some() {
                    self.seed = result;
                }
            }
            PartitionSource::Entity(_) => {}
        }
        Ok(self)
    }

    /// Stage 2: schema then table lookup
    pub fn add_navigation(mut self) -> Self {
        let partition = self.partition;
        if let Some(navigation) = partition.navigation() {
            self.bind(
                SCHEMA_VAR,
                format!("{}{{[Name = {}, Kind = \"Schema\"]}}[Data]", DATABASE_VAR, quote(&navigation.schema)),
            );
            self.bind(
                TABLE_VAR,
                format!("{}{{[Name = {}, Kind = \"Table\"]}}[Data]", SCHEMA_VAR, quote(&navigation.table)),
            );
        }
        self
    }

    /// Stage 3: run the native query against the database scope
    pub fn add_native_query(mut self) -> Self {
        let partition = self.partition;
        if let Some(query) = partition.native_query() {
            self.bind(
                QUERY_VAR,
                format!(
                    "Value.NativeQuery({}, \"{}\", null, [EnableFolding = true])",
                    DATABASE_VAR,
                    escape_text(query.trim())
                ),
            );
        }
        self
    }

    /// Stage 4: project the declared columns under `select_only`. Does
    /// nothing without a seed.
    pub fn add_column_selection(mut self) -> Self {
        let Some(seed) = self.seed.clone() else {
            return self;
        };
        if self.table.columns.is_empty() {
            return self;
        }
        match self.table.column_policy {
            ColumnPolicy::SelectOnly => {
                let names: Vec<String> = self.table.columns.iter().map(|c| quote(&c.name)).collect();
                let expr = format!(
                    "Table.SelectColumns({}, {{{}}}, MissingField.UseNull)",
                    seed,
                    names.join(", ")
                );
                self.bind(SELECTED_VAR, expr);
            }
            ColumnPolicy::HideExtras => {
                debug!(
                    table = %self.table.name,
                    "hide_extras passes all source columns through like keep_all"
                );
            }
            ColumnPolicy::KeepAll => {}
        }
        self
    }

    /// Stage 5: coerce every declared column to its M type. Does nothing
    /// without a seed.
    pub fn add_type_transformation(mut self) -> Self {
        let Some(seed) = self.seed.clone() else {
            return self;
        };
        if self.table.columns.is_empty() {
            return self;
        }
        let types: Vec<String> = self
            .table
            .columns
            .iter()
            .map(|c| format!("{{{}, {}}}", quote(&c.name), c.data_type().m_type()))
            .collect();
        let expr = format!(
            "Table.TransformColumnTypes({}, {{{}}})",
            seed,
            types.join(", ")
        );
        self.bind(TYPED_VAR, expr);
        self
    }

    fn fresh_name(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.bindings.iter().map(|b| b.name.as_str()).collect();
        if !taken.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    fn arguments_error(&self, step: &CustomStep, message: &str) -> BuildError {
        BuildError::TransformArguments {
            partition: self.partition.name.clone(),
            transform: step.name.clone(),
            message: message.to_string(),
        }
    }

    /// Stage 6: apply each custom step to the seed, in order. Nothing is
    /// bound without a seed.
    pub fn add_custom_transforms(mut self, registry: &TransformRegistry) -> Result<Self, BuildError> {
        let partition = self.partition;
        let steps = &partition.custom_steps;
        if steps.is_empty() {
            return Ok(self);
        }

        let mut missing: Vec<String> = Vec::new();
        for step in steps {
            if !registry.contains(&step.name) && !missing.contains(&step.name) {
                missing.push(step.name.clone());
            }
        }
        if !missing.is_empty() {
            return Err(BuildError::UnknownTransforms {
                partition: self.partition.name.clone(),
                table: self.table.name.clone(),
                names: missing,
            });
        }

        if let Some(advisory) = self.fold_advisory() {
            warn!("{}", advisory);
        }

        for (idx, step) in steps.iter().enumerate() {
            let Some(snippet) = registry.get(&step.name) else {
                continue;
            };
            let Some(seed) = self.seed.clone() else {
                break;
            };

            let expr = match (&snippet.kind, step.args.as_deref()) {
                (SnippetKind::Table { param, body }, None) => {
                    let body = strip_trailing_line_comment(body);
                    dedent(&substitute_identifier(body, param, &seed))
                }
                (SnippetKind::Table { .. }, Some(_)) => {
                    return Err(self.arguments_error(step, "table transforms take no arguments"));
                }
                (SnippetKind::HigherOrder { .. }, Some(args)) => {
                    let text = strip_trailing_line_comment(&snippet.text);
                    format!("({})({})({})", dedent(text), args, seed)
                }
                (SnippetKind::HigherOrder { .. }, None) => {
                    return Err(self.arguments_error(
                        step,
                        "function-returning transforms must be called as name(args)",
                    ));
                }
            };

            let name = self.fresh_name(&format!("__{}_{}", snippet.name, idx + 1));
            let origin = registry
                .origin(&step.name)
                .map_or_else(|| "<inline>".to_string(), |p| p.display().to_string());
            debug!(
                partition = %self.partition.name,
                step = %step.name,
                var = %name,
                higher_order = snippet.is_higher_order(),
                origin = %origin,
                "Applied transform"
            );
            self.bind(name, expr);
        }

        Ok(self)
    }

    /// Warning text for a DirectQuery partition that applies custom steps
    pub fn fold_advisory(&self) -> Option<String> {
        let steps = &self.partition.custom_steps;
        if self.partition.mode != PartitionMode::DirectQuery || steps.is_empty() {
            return None;
        }
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        Some(format!(
            "Partition '{}' in table '{}' is DirectQuery and applies transforms that may not fold: [{}]",
            self.partition.name,
            self.table.name,
            names.join(", ")
        ))
    }

    /// Stage 7: join the bindings and return the seed
    pub fn build(self) -> Result<String, BuildError> {
        let seed = self.seed.ok_or_else(|| BuildError::NoSeed {
            partition: self.partition.name.clone(),
        })?;

        let body: Vec<String> = self.bindings.iter().map(Binding::to_string).collect();
        Ok(format!("let\n{}\nin\n  {}", body.join(",\n"), seed))
    }
}

/// Generate the M expression for one partition of `table`
pub fn generate_partition_mcode(
    table: &Table,
    partition: &Partition,
    sources: &SourcesSpec,
    registry: &TransformRegistry,
) -> Result<String, BuildError> {
    PartitionBuilder::new(table, partition, sources)
        .add_source_connection()?
        .add_navigation()
        .add_native_query()
        .add_column_selection()
        .add_type_transformation()
        .add_custom_transforms(registry)?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: &str = r#"
sources:
  sf_main: { kind: snowflake, server: acme.snowflakecomputing.com, warehouse: WH }
  sf_sales: { kind: snowflake, server: acme.snowflakecomputing.com, database: SALES }
  book: { kind: excel, file_path: /data/finance.xlsx, workbook_name: financials }
"#;

    fn sources() -> SourcesSpec {
        serde_yaml::from_str(SOURCES).unwrap()
    }

    fn table(yaml: &str) -> Table {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn dim_date(partition: &str) -> Table {
        table(&format!(
            r#"
name: DimDate
columns:
  - {{ name: Date, dataType: date }}
  - {{ name: Year, dataType: int64 }}
partitions:
  - {}
"#,
            partition
        ))
    }

    fn generate(t: &Table, registry: &TransformRegistry) -> Result<String, BuildError> {
        generate_partition_mcode(t, t.primary_partition().unwrap(), &sources(), registry)
    }

    fn binding_names(m: &str) -> Vec<&str> {
        m.lines()
            .filter(|l| l.starts_with("  ") && !l.starts_with("    "))
            .filter_map(|l| l.trim().split_once(" =").map(|(n, _)| n))
            .collect()
    }

    /// One terminal `in`, no separator right before it
    fn assert_well_formed(m: &str) {
        let lines: Vec<&str> = m.lines().collect();
        assert_eq!(lines.first(), Some(&"let"));
        assert_eq!(lines.iter().filter(|l| **l == "in").count(), 1, "{}", m);
        let in_pos = lines.iter().position(|l| *l == "in").unwrap();
        assert_eq!(in_pos, lines.len() - 2);
        assert!(!lines[in_pos - 1].trim_end().ends_with(','), "{}", m);
    }

    #[test]
    fn test_scenario_navigation_select_only() {
        let t = dim_date("{ name: Full, use: sf_main, navigation: SALES.DIM.DATE }");
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        let expected = r#"let
  SourceColl = Snowflake.Databases("acme.snowflakecomputing.com", "WH"),
  DB = SourceColl{[Name = "SALES", Kind = "Database"]}[Data],
  SCH = DB{[Name = "DIM", Kind = "Schema"]}[Data],
  TBL = SCH{[Name = "DATE", Kind = "Table"]}[Data],
  Selected = Table.SelectColumns(TBL, {"Date", "Year"}, MissingField.UseNull),
  Typed = Table.TransformColumnTypes(Selected, {{"Date", Date.Type}, {"Year", Int64.Type}})
in
  Typed"#;
        assert_eq!(m, expected);
        assert_well_formed(&m);
    }

    #[test]
    fn test_scenario_native_query_escaping() {
        let t = dim_date(
            r#"{ name: Q, use: sf_sales, nativeQuery: 'SELECT "Date", YEAR("Date") AS "Year" FROM DIM.DATE' }"#,
        );
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        assert!(m.contains(
            r#"Result = Value.NativeQuery(DB, "SELECT ""Date"", YEAR(""Date"") AS ""Year"" FROM DIM.DATE", null, [EnableFolding = true])"#
        ));
        let names = binding_names(&m);
        assert_eq!(names, vec!["DB", "Result", "Selected", "Typed"]);
        assert!(m.contains("Table.SelectColumns(Result,"));
        assert_well_formed(&m);
    }

    #[test]
    fn test_native_query_requires_database() {
        let t = dim_date("{ name: Q, use: sf_main, nativeQuery: 'SELECT 1' }");
        let err = generate(&t, &TransformRegistry::new()).unwrap_err();
        assert!(matches!(err, BuildError::MissingDatabase { ref partition, ref source } if partition == "Q" && source == "sf_main"));
    }

    #[test]
    fn test_keep_all_skips_projection() {
        let t = table(
            r#"
name: DimDate
column_policy: keep_all
columns: [{ name: Date, dataType: date }]
partitions: [{ name: P, use: sf_sales, navigation: DIM.DATE }]
"#,
        );
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        assert_eq!(binding_names(&m), vec!["DB", "SCH", "TBL", "Typed"]);
        assert!(m.contains("Table.TransformColumnTypes(TBL,"));
        assert_well_formed(&m);
    }

    #[test]
    fn test_hide_extras_behaves_like_keep_all() {
        let t = table(
            r#"
name: DimDate
column_policy: hide_extras
columns: [{ name: Date, dataType: date }]
partitions: [{ name: P, use: sf_sales, navigation: DIM.DATE }]
"#,
        );
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        assert!(!m.contains("SelectColumns"));
    }

    #[test]
    fn test_no_columns_returns_table() {
        let t = table("name: Raw\npartitions: [{ name: P, use: sf_sales, navigation: DIM.DATE }]");
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        assert!(m.ends_with("in\n  TBL"));
    }

    #[test]
    fn test_simple_source_uses_template_result() {
        let t = table(
            r#"
name: Finance
source: { use: book }
columns: [{ name: Segment, dataType: string }]
partitions: [{ name: P }]
"#,
        );
        let m = generate(&t, &TransformRegistry::new()).unwrap();
        assert_eq!(binding_names(&m), vec!["Source", "Item", "Promoted", "Selected", "Typed"]);
        assert!(m.contains("Selected = Table.SelectColumns(Promoted, {\"Segment\"}, MissingField.UseNull)"));
        assert_well_formed(&m);
    }

    #[test]
    fn test_transforms_chain_in_order() {
        let registry = TransformRegistry::from_texts([
            ("f", "(t as table) as table => Table.Distinct(t)"),
            ("g", "(x as table) as table => Table.FirstN(x, 10)"),
        ])
        .unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [f, g] }");
        let m = generate(&t, &registry).unwrap();

        let f_pos = m.find("__f_1 = Table.Distinct(Typed)").expect("f binding");
        let g_pos = m.find("__g_2 = Table.FirstN(__f_1, 10)").expect("g binding");
        assert!(f_pos < g_pos);
        assert!(m.ends_with("in\n  __g_2"));
        assert_well_formed(&m);
    }

    #[test]
    fn test_let_block_transform_is_indented() {
        let registry = TransformRegistry::from_texts([(
            "clean",
            "(t as table) as table =>\nlet\n  trimmed = Table.TransformColumns(t, {{\"t\", Text.Trim}})\nin\n  trimmed",
        )])
        .unwrap();
        let t = table(
            "name: T\ncolumn_policy: keep_all\npartitions: [{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [clean] }]",
        );
        let m = generate(&t, &registry).unwrap();
        let expected = r#"let
  DB = Snowflake.Databases("acme.snowflakecomputing.com"){[Name = "SALES", Kind = "Database"]}[Data],
  SCH = DB{[Name = "DIM", Kind = "Schema"]}[Data],
  TBL = SCH{[Name = "DATE", Kind = "Table"]}[Data],
  __clean_1 =
    let
      trimmed = Table.TransformColumns(TBL, {{"t", Text.Trim}})
    in
      trimmed
in
  __clean_1"#;
        assert_eq!(m, expected);
    }

    #[test]
    fn test_unknown_transforms_reported_together() {
        let registry = TransformRegistry::from_texts([("f", "(t as table) as table => t")]).unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [a, f, b, a] }");
        match generate(&t, &registry).unwrap_err() {
            BuildError::UnknownTransforms { names, table, .. } => {
                assert_eq!(names, vec!["a", "b"]);
                assert_eq!(table, "DimDate");
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_higher_order_transform() {
        let registry = TransformRegistry::from_texts([(
            "limit_rows",
            "(n as number) as function => (t as table) as table => Table.FirstN(t, n)",
        )])
        .unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: ['limit_rows(500)'] }");
        let m = generate(&t, &registry).unwrap();
        assert!(m.contains(
            "__limit_rows_1 = ((n as number) as function => (t as table) as table => Table.FirstN(t, n))(500)(Typed)"
        ));

        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [limit_rows] }");
        assert!(matches!(
            generate(&t, &registry).unwrap_err(),
            BuildError::TransformArguments { .. }
        ));
    }

    #[test]
    fn test_table_transform_rejects_arguments() {
        let registry = TransformRegistry::from_texts([("f", "(t as table) as table => t")]).unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: ['f(1)'] }");
        assert!(matches!(
            generate(&t, &registry).unwrap_err(),
            BuildError::TransformArguments { .. }
        ));
    }

    #[test]
    fn test_directquery_with_transforms_still_builds() {
        let registry = TransformRegistry::from_texts([("f", "(t as table) as table => Table.Distinct(t)")]).unwrap();
        let t = dim_date("{ name: P, mode: directquery, use: sf_sales, navigation: DIM.DATE, custom_steps: [f] }");
        let m = generate(&t, &registry).unwrap();
        let expected = r#"let
  DB = Snowflake.Databases("acme.snowflakecomputing.com"){[Name = "SALES", Kind = "Database"]}[Data],
  SCH = DB{[Name = "DIM", Kind = "Schema"]}[Data],
  TBL = SCH{[Name = "DATE", Kind = "Table"]}[Data],
  Selected = Table.SelectColumns(TBL, {"Date", "Year"}, MissingField.UseNull),
  Typed = Table.TransformColumnTypes(Selected, {{"Date", Date.Type}, {"Year", Int64.Type}}),
  __f_1 = Table.Distinct(Typed)
in
  __f_1"#;
        assert_eq!(m, expected);
        assert_well_formed(&m);
    }

    #[test]
    fn test_fold_advisory_only_for_directquery_with_steps() {
        let s = sources();
        let t = dim_date("{ name: P, mode: directquery, use: sf_sales, navigation: DIM.DATE, custom_steps: [f, 'top(5)'] }");
        let builder = PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s);
        assert_eq!(
            builder.fold_advisory().as_deref(),
            Some("Partition 'P' in table 'DimDate' is DirectQuery and applies transforms that may not fold: [f, top]")
        );

        let t = dim_date("{ name: P, mode: directquery, use: sf_sales, navigation: DIM.DATE }");
        assert_eq!(PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s).fold_advisory(), None);

        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [f] }");
        assert_eq!(PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s).fold_advisory(), None);
    }

    #[test]
    fn test_trailing_line_comment_keeps_separator() {
        let registry = TransformRegistry::from_texts([
            ("dedupe", "(t as table) as table => Table.Distinct(t) // drop duplicates"),
            ("f", "(t as table) as table => t"),
        ])
        .unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: [dedupe, f] }");
        let m = generate(&t, &registry).unwrap();
        assert!(m.contains("  __dedupe_1 = Table.Distinct(Typed),\n  __f_2 = __dedupe_1\nin"), "{}", m);
        assert!(!m.contains("//"));
        assert_well_formed(&m);
    }

    #[test]
    fn test_trailing_line_comment_in_higher_order_transform() {
        let registry = TransformRegistry::from_texts([(
            "top",
            "(n as number) as function => (t as table) as table => Table.FirstN(t, n) // keep n",
        )])
        .unwrap();
        let t = dim_date("{ name: P, use: sf_sales, navigation: DIM.DATE, custom_steps: ['top(5)'] }");
        let m = generate(&t, &registry).unwrap();
        assert!(m.ends_with(
            "  __top_1 = ((n as number) as function => (t as table) as table => Table.FirstN(t, n))(5)(Typed)\nin\n  __top_1"
        ), "{}", m);
    }

    #[test]
    fn test_fresh_names_are_suffixed_until_unused() {
        let t = table("name: F\nsource: { use: book }\npartitions: [{ name: P }]");
        let s = sources();
        let mut builder = PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s);
        assert_eq!(builder.fresh_name("__f_1"), "__f_1");
        builder.bind("__f_1", "x");
        builder.bind("__f_1_2", "y");
        assert_eq!(builder.fresh_name("__f_1"), "__f_1_3");
    }

    #[test]
    fn test_transform_on_simple_source() {
        let registry = TransformRegistry::from_texts([("dedupe", "(t as table) as table => Table.Distinct(t)")]).unwrap();
        let t = table("name: F\nsource: { use: book }\npartitions: [{ name: P, custom_steps: [dedupe] }]");
        let m = generate(&t, &registry).unwrap();
        assert!(m.contains("__dedupe_1 = Table.Distinct(Promoted)"));
        assert!(m.ends_with("in\n  __dedupe_1"));
    }

    #[test]
    fn test_unknown_source() {
        let t = dim_date("{ name: P, use: nowhere, navigation: DIM.DATE }");
        assert!(matches!(
            generate(&t, &TransformRegistry::new()).unwrap_err(),
            BuildError::UnknownSource { .. }
        ));
    }

    #[test]
    fn test_entity_partition_has_no_seed() {
        let t = table(
            "name: E\ncolumns: [{ name: a, dataType: string }]\npartitions: [{ name: P, mode: entity, entity: { name: sales } }]",
        );
        let s = sources();
        let builder = PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s)
            .add_source_connection()
            .unwrap()
            .add_navigation()
            .add_native_query()
            .add_column_selection()
            .add_type_transformation();
        assert!(builder.bindings().is_empty());
        assert_eq!(builder.seed(), None);

        assert!(matches!(
            generate(&t, &TransformRegistry::new()).unwrap_err(),
            BuildError::NoSeed { ref partition } if partition == "P"
        ));
    }

    #[test]
    fn test_stages_are_independent() {
        let t = dim_date("{ name: Full, use: sf_main, navigation: SALES.DIM.DATE }");
        let s = sources();
        let partition = t.primary_partition().unwrap();

        let builder = PartitionBuilder::new(&t, partition, &s).add_source_connection().unwrap();
        assert_eq!(builder.seed(), Some("DB"));
        let builder = builder.add_navigation();
        assert_eq!(builder.seed(), Some("TBL"));
        let builder = builder.add_native_query();
        assert_eq!(builder.seed(), Some("TBL"));
        let builder = builder.add_column_selection();
        assert_eq!(builder.seed(), Some("Selected"));
        assert_eq!(builder.bindings().len(), 5);
    }

    #[test]
    fn test_build_without_connection_fails() {
        let t = dim_date("{ name: Full, use: sf_main, navigation: SALES.DIM.DATE }");
        let s = sources();
        let err = PartitionBuilder::new(&t, t.primary_partition().unwrap(), &s)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::NoSeed { .. }));
    }
}
