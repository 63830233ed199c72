//! Table definitions and the per-kind structural invariants

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use super::column::Column;
use super::measure::{BaseMeasures, Measure};
use super::partition::{Partition, PartitionDef};
use super::types::ColumnPolicy;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableKind {
    #[default]
    Table,
    MeasureTable,
    CalculatedTable,
    CalculationGroup,
    FieldParameter,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Table => write!(f, "table"),
            TableKind::MeasureTable => write!(f, "measureTable"),
            TableKind::CalculatedTable => write!(f, "calculatedTable"),
            TableKind::CalculationGroup => write!(f, "calculationGroup"),
            TableKind::FieldParameter => write!(f, "fieldParameter"),
        }
    }
}

/// Formula of a calculated table: inline DAX or a named template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalculatedTableDef {
    pub expression: Option<String>,
    pub template: Option<String>,
}

impl CalculatedTableDef {
    /// The DAX expression, once present (inline or substituted from a template)
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// One variant of a calculation group
#[derive(Debug, Clone, Deserialize)]
pub struct CalculationItem {
    pub name: String,
    pub expression: String,
    pub ordinal: Option<u32>,
    #[serde(rename = "formatStringExpression")]
    pub format_string_expression: Option<String>,
    pub description: Option<String>,
}

/// A field offered by a field parameter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldParameterEntry {
    /// `Table[Column]` or `[Measure]`
    Field(String),
    Labeled { label: String, field: String },
}

impl FieldParameterEntry {
    pub fn field(&self) -> &str {
        match self {
            FieldParameterEntry::Field(f) => f,
            FieldParameterEntry::Labeled { field, .. } => field,
        }
    }

    /// Display label; defaults to the bracketed member name
    pub fn label(&self) -> &str {
        match self {
            FieldParameterEntry::Labeled { label, .. } => label,
            FieldParameterEntry::Field(f) => f
                .rsplit_once('[')
                .map(|(_, rest)| rest.trim_end_matches(']'))
                .unwrap_or(f),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldParameterDef {
    #[serde(default)]
    pub fields: Vec<FieldParameterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TableSourceRef {
    #[serde(rename = "use")]
    use_source: Option<String>,
}

/// Raw table as written in YAML
#[derive(Debug, Deserialize)]
struct TableDef {
    name: String,
    #[serde(default)]
    kind: TableKind,
    #[serde(default)]
    column_policy: ColumnPolicy,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    measures: Vec<Measure>,
    base_measures: Option<BaseMeasures>,
    #[serde(default)]
    partitions: Vec<PartitionDef>,
    source: Option<TableSourceRef>,
    description: Option<String>,
    #[serde(rename = "isHidden", default)]
    is_hidden: bool,
    #[serde(rename = "calculatedTableDef")]
    calculated_table_def: Option<CalculatedTableDef>,
    #[serde(rename = "calculationGroupItems", default)]
    calculation_group_items: Vec<CalculationItem>,
    #[serde(rename = "calculationGroupPrecedence")]
    calculation_group_precedence: Option<i64>,
    #[serde(rename = "fieldParameter")]
    field_parameter: Option<FieldParameterDef>,
}

/// A validated table
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TableDef")]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    pub column_policy: ColumnPolicy,
    pub columns: Vec<Column>,
    /// Generated base measures followed by explicit measures
    pub measures: Vec<Measure>,
    pub partitions: Vec<Partition>,
    pub description: Option<String>,
    pub is_hidden: bool,
    pub calculated: Option<CalculatedTableDef>,
    pub calculation_items: Vec<CalculationItem>,
    pub calculation_group_precedence: Option<i64>,
    pub field_parameter: Option<FieldParameterDef>,
}

impl TryFrom<TableDef> for Table {
    type Error = ValidationError;

    fn try_from(def: TableDef) -> Result<Self, Self::Error> {
        let context = format!("table '{}'", def.name);

        let mut seen = HashSet::new();
        for column in &def.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ValidationError::new(
                    &context,
                    format!("duplicate column '{}'", column.name),
                ));
            }
        }

        let mut measures = match &def.base_measures {
            Some(base) => base.expand(&def.name)?,
            None => Vec::new(),
        };
        measures.extend(def.measures);

        let forbid = |present: bool, what: &str| -> Result<(), ValidationError> {
            if present {
                Err(ValidationError::new(
                    &context,
                    format!("{} tables must not define {}", def.kind, what),
                ))
            } else {
                Ok(())
            }
        };
        let has_calc = def.calculated_table_def.is_some();
        let has_items = !def.calculation_group_items.is_empty();
        let has_fields = def.field_parameter.is_some();
        let has_partitions = !def.partitions.is_empty();
        let has_columns = !def.columns.is_empty();

        match def.kind {
            TableKind::Table => {
                forbid(has_calc, "calculatedTableDef")?;
                forbid(has_items, "calculationGroupItems")?;
                forbid(has_fields, "fieldParameter")?;
                if !has_partitions {
                    return Err(ValidationError::new(&context, "table requires at least one partition"));
                }
            }
            TableKind::MeasureTable => {
                forbid(has_columns, "columns")?;
                forbid(has_partitions, "partitions")?;
                forbid(has_calc, "calculatedTableDef")?;
                forbid(has_items, "calculationGroupItems")?;
                forbid(has_fields, "fieldParameter")?;
                if measures.is_empty() {
                    return Err(ValidationError::new(&context, "measureTable requires at least one measure"));
                }
            }
            TableKind::CalculatedTable => {
                forbid(has_partitions, "partitions")?;
                forbid(has_items, "calculationGroupItems")?;
                forbid(has_fields, "fieldParameter")?;
                let calc = def.calculated_table_def.as_ref().ok_or_else(|| {
                    ValidationError::new(&context, "calculatedTable requires calculatedTableDef")
                })?;
                let has_expression = calc.expression().is_some();
                let has_template = calc.template.as_deref().is_some_and(|t| !t.trim().is_empty());
                if has_expression == has_template {
                    return Err(ValidationError::new(
                        &context,
                        "calculatedTableDef requires exactly one of expression or template",
                    ));
                }
            }
            TableKind::CalculationGroup => {
                forbid(has_columns, "columns")?;
                forbid(has_partitions, "partitions")?;
                forbid(has_calc, "calculatedTableDef")?;
                forbid(has_fields, "fieldParameter")?;
                if !has_items {
                    return Err(ValidationError::new(
                        &context,
                        "calculationGroup requires at least one calculationGroupItems entry",
                    ));
                }
            }
            TableKind::FieldParameter => {
                forbid(has_partitions, "partitions")?;
                forbid(has_calc, "calculatedTableDef")?;
                forbid(has_items, "calculationGroupItems")?;
                let empty = def.field_parameter.as_ref().map_or(true, |fp| fp.fields.is_empty());
                if empty {
                    return Err(ValidationError::new(
                        &context,
                        "fieldParameter requires at least one field",
                    ));
                }
            }
        }

        let table_source = def
            .source
            .as_ref()
            .and_then(|s| s.use_source.as_deref());
        let partitions = def
            .partitions
            .into_iter()
            .map(|p| Partition::from_def(p, &def.name, table_source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Table {
            name: def.name,
            kind: def.kind,
            column_policy: def.column_policy,
            columns: def.columns,
            measures,
            partitions,
            description: def.description,
            is_hidden: def.is_hidden,
            calculated: def.calculated_table_def,
            calculation_items: def.calculation_group_items,
            calculation_group_precedence: def.calculation_group_precedence,
            field_parameter: def.field_parameter,
        })
    }
}

impl Table {
    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The partition that gets compiled
    pub fn primary_partition(&self) -> Option<&Partition> {
        self.partitions.first()
    }
}
