//! Calculated table resolution: DAX template substitution and column lineage inference

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;
use super::error::ResolveError;
use crate::registry::DaxTemplates;
use crate::semantic_model::{ColumnRef, DataType, Endpoint, ModelBody, SummarizeBy, TableKind};

fn column_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:'(?P<qt>(?:[^']|'')+)'|(?P<t>[A-Za-z_][A-Za-z0-9_]*))\[(?P<c>[^\[\]]+)\]")
            .expect("Invalid column reference regex")
    })
}

/// Fully qualified column references in a DAX expression, in order of
/// appearance
pub fn column_references(expression: &str) -> Vec<ColumnRef> {
    column_ref_regex()
        .captures_iter(expression)
        .map(|caps| {
            let table = match (caps.name("qt"), caps.name("t")) {
                (Some(q), _) => q.as_str().replace("''", "'"),
                (None, Some(t)) => t.as_str().to_string(),
                (None, None) => String::new(),
            };
            ColumnRef::new(table, caps["c"].trim())
        })
        .collect()
}

/// Substitute templates and infer lineage for every calculated table.
///
/// All missing templates are reported in one error. Explicit `sourceLineage`
/// and `summarizeBy` values are kept.
pub fn resolve_calculated_tables(
    model: &mut ModelBody,
    templates: &DaxTemplates,
) -> Result<(), ResolveError> {
    let mut missing = Vec::new();
    for table in model.tables.iter_mut().filter(|t| t.kind == TableKind::CalculatedTable) {
        let Some(calc) = table.calculated.as_mut() else {
            continue;
        };
        if calc.expression().is_some() {
            continue;
        }
        let Some(name) = calc.template.clone() else {
            continue;
        };
        match templates.get(&name) {
            Some(body) => {
                debug!(table = %table.name, template = %name, "Substituted DAX template");
                calc.expression = Some(body.to_string());
            }
            None => missing.push((table.name.clone(), name)),
        }
    }
    if !missing.is_empty() {
        return Err(ResolveError::MissingTemplates(missing));
    }

    let table_names: HashSet<String> = model.tables.iter().map(|t| t.name.clone()).collect();
    let column_types: HashMap<(String, String), DataType> = model
        .tables
        .iter()
        .flat_map(|t| {
            t.columns
                .iter()
                .map(move |c| ((t.name.clone(), c.name.clone()), c.data_type()))
        })
        .collect();

    for table in model.tables.iter_mut().filter(|t| t.kind == TableKind::CalculatedTable) {
        let references = table
            .calculated
            .as_ref()
            .and_then(|c| c.expression())
            .map(column_references)
            .unwrap_or_default();

        for column in table.columns.iter_mut() {
            let lineage = match column.source_lineage.as_deref() {
                Some(explicit) => match explicit.parse::<Endpoint>() {
                    Ok(Endpoint::Column(r)) if table_names.contains(&r.table) => r,
                    _ => {
                        return Err(ResolveError::InvalidLineage {
                            table: table.name.clone(),
                            column: column.name.clone(),
                            lineage: explicit.to_string(),
                        })
                    }
                },
                None => {
                    let inferred = references.iter().find(|r| {
                        r.column == column.name && r.table != table.name && table_names.contains(&r.table)
                    });
                    match inferred {
                        Some(r) => {
                            column.source_lineage = Some(r.to_string());
                            r.clone()
                        }
                        None => continue,
                    }
                }
            };

            if column.summarize_by.is_none() {
                if let Some(data_type) = column_types.get(&(lineage.table.clone(), lineage.column.clone())) {
                    column.summarize_by = Some(if data_type.is_numeric() {
                        SummarizeBy::Sum
                    } else {
                        SummarizeBy::None
                    });
                }
            }
            debug!(table = %table.name, column = %column.name, lineage = %lineage, "Resolved column lineage");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_model::ModelSpec;

    fn model(calculated: &str) -> ModelBody {
        let yaml = format!(
            r#"
model:
  name: M
  tables:
    - name: Sales
      columns:
        - {{ name: Region, dataType: string }}
        - {{ name: Amount, dataType: decimal }}
      partitions: [{{ name: P, use: sf, navigation: A.B.C }}]
    - name: Sales Targets
      columns:
        - {{ name: Target, dataType: int64 }}
      partitions: [{{ name: P, use: sf, navigation: A.B.D }}]
{}
"#,
            calculated
        );
        serde_yaml::from_str::<ModelSpec>(&yaml).unwrap().model
    }

    #[test]
    fn test_column_references() {
        let refs = column_references("SUMMARIZE(Sales, Sales[Region], 'Sales Targets'[Target], \"x\", [m])");
        assert_eq!(
            refs,
            vec![ColumnRef::new("Sales", "Region"), ColumnRef::new("Sales Targets", "Target")]
        );
        let refs = column_references("VALUES('O''Brien'[Name])");
        assert_eq!(refs, vec![ColumnRef::new("O'Brien", "Name")]);
    }

    #[test]
    fn test_template_substitution_and_lineage() {
        let mut m = model(
            r#"
    - name: Regions
      kind: calculatedTable
      calculatedTableDef: { template: regions }
      columns:
        - { name: Region, dataType: string }
        - { name: Amount, dataType: decimal }
        - { name: Target, dataType: int64, summarizeBy: none }
        - { name: Label, dataType: string }
"#,
        );
        let mut templates = DaxTemplates::new();
        templates.insert(
            "regions",
            "SUMMARIZECOLUMNS(Sales[Region], \"Amount\", SUM(Sales[Amount]), 'Sales Targets'[Target])",
        );

        resolve_calculated_tables(&mut m, &templates).unwrap();
        let t = m.get_table("Regions").unwrap();
        assert!(t.calculated.as_ref().unwrap().expression().unwrap().starts_with("SUMMARIZECOLUMNS"));

        let region = t.get_column("Region").unwrap();
        assert_eq!(region.source_lineage.as_deref(), Some("Sales[Region]"));
        assert_eq!(region.summarize_by, Some(SummarizeBy::None));

        let amount = t.get_column("Amount").unwrap();
        assert_eq!(amount.summarize_by, Some(SummarizeBy::Sum));

        let target = t.get_column("Target").unwrap();
        assert_eq!(target.source_lineage.as_deref(), Some("Sales Targets[Target]"));
        assert_eq!(target.summarize_by, Some(SummarizeBy::None));

        let label = t.get_column("Label").unwrap();
        assert!(label.source_lineage.is_none());
        assert!(label.summarize_by.is_none());
    }

    #[test]
    fn test_missing_templates_reported_together() {
        let mut m = model(
            r#"
    - name: A
      kind: calculatedTable
      calculatedTableDef: { template: first }
    - name: B
      kind: calculatedTable
      calculatedTableDef: { template: second }
"#,
        );
        let err = resolve_calculated_tables(&mut m, &DaxTemplates::new()).unwrap_err();
        match err {
            ResolveError::MissingTemplates(missing) => {
                assert_eq!(
                    missing,
                    vec![("A".to_string(), "first".to_string()), ("B".to_string(), "second".to_string())]
                );
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_explicit_lineage_validated() {
        let mut m = model(
            r#"
    - name: C
      kind: calculatedTable
      calculatedTableDef: { expression: "VALUES(Sales[Region])" }
      columns:
        - { name: Region, dataType: string, sourceLineage: "Nowhere[Region]" }
"#,
        );
        assert!(matches!(
            resolve_calculated_tables(&mut m, &DaxTemplates::new()),
            Err(ResolveError::InvalidLineage { .. })
        ));
    }
}
