//! TMDL emitter
//!
//! Renders model objects as Tabular Model Definition Language text. Objects
//! nest with one tab per level; multi-line DAX goes in triple-backtick
//! blocks and M expressions are indented one level below their property.

use crate::semantic_model::{
    Cardinality, Column, CrossFilter, EntityRef, FieldParameterEntry, Measure, ModelBody,
    PartitionMode, Relationship, Table, TableKind,
};

fn pad(indent: usize) -> String {
    "\t".repeat(indent)
}

/// Quote an object name when it is not a plain identifier
pub fn quote_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn column_path(table: &str, column: &str) -> String {
    format!("{}.{}", quote_name(table), quote_name(column))
}

/// `/// text` lines placed above an object
fn description(lines: &mut Vec<String>, text: Option<&str>, indent: usize) {
    if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
        for line in text.lines() {
            lines.push(format!("{}/// {}", pad(indent), line.trim_end()));
        }
    }
}

/// `head = expr` for a DAX expression, using a backtick block when it spans
/// several lines
fn dax_assignment(lines: &mut Vec<String>, head: &str, expression: &str, indent: usize) {
    let expression = expression.trim();
    if !expression.contains('\n') {
        lines.push(format!("{}{} = {}", pad(indent), head, expression));
        return;
    }
    lines.push(format!("{}{} = ```", pad(indent), head));
    for line in expression.lines() {
        lines.push(format!("{}{}", pad(indent + 2), line.trim_end()));
    }
    lines.push(format!("{}```", pad(indent + 2)));
}

/// `source =` followed by an indented M expression
fn m_source(lines: &mut Vec<String>, expression: &str, indent: usize) {
    lines.push(format!("{}source =", pad(indent)));
    for line in expression.lines() {
        if line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{}{}", pad(indent + 1), line));
        }
    }
}

// ---------------------------------------------------------------------------
// Model-level files
// ---------------------------------------------------------------------------

pub fn emit_database(model: &ModelBody) -> String {
    format!("database\n\tcompatibilityLevel: {}\n", model.compatibility_level)
}

pub fn emit_model(model: &ModelBody) -> String {
    let mut lines = Vec::new();
    description(&mut lines, model.description.as_deref(), 0);
    lines.push(format!("model {}", quote_name(&model.name)));
    lines.push(format!("\tculture: {}", model.culture));
    lines.push("\tdefaultPowerBIDataSourceVersion: powerBI_V3".to_string());
    lines.push(format!("\tsourceQueryCulture: {}", model.culture));
    lines.push("\tdataAccessOptions".to_string());
    lines.push("\t\tlegacyRedirects".to_string());
    lines.push("\t\treturnErrorValuesAsNull".to_string());
    lines.push(String::new());
    for table in &model.tables {
        lines.push(format!("ref table {}", quote_name(&table.name)));
    }
    lines.push(String::new());
    lines.push(format!("ref cultureInfo {}", model.culture));
    lines.push(String::new());
    lines.join("\n")
}

pub fn emit_culture(model: &ModelBody) -> String {
    format!("cultureInfo {}\n", model.culture)
}

/// Shared expressions, one per source: `(name, M expression)`
pub fn emit_expressions(expressions: &[(String, String)]) -> String {
    let mut lines = Vec::new();
    for (name, expression) in expressions {
        lines.push(format!("expression {} =", quote_name(name)));
        for line in expression.lines() {
            lines.push(format!("{}{}", pad(2), line));
        }
        lines.push(format!("{}meta [IsParameterQuery = false]", pad(2)));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn emit_relationships(relationships: &[Relationship]) -> String {
    let mut lines = Vec::new();
    for rel in relationships {
        lines.push(format!("relationship {}", quote_name(&rel.name)));
        match rel.cardinality {
            Cardinality::ManyToOne => {}
            Cardinality::OneToMany => {
                lines.push("\tfromCardinality: one".to_string());
                lines.push("\ttoCardinality: many".to_string());
            }
            Cardinality::OneToOne => lines.push("\tfromCardinality: one".to_string()),
        }
        if rel.cross_filter == CrossFilter::Both {
            lines.push("\tcrossFilteringBehavior: bothDirections".to_string());
        }
        if !rel.is_active {
            lines.push("\tisActive: false".to_string());
        }
        lines.push(format!("\tfromColumn: {}", column_path(&rel.from.table, &rel.from.column)));
        lines.push(format!("\ttoColumn: {}", column_path(&rel.to.table, &rel.to.column)));
        lines.push(String::new());
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn emit_measure(lines: &mut Vec<String>, measure: &Measure) {
    lines.push(String::new());
    description(lines, measure.description.as_deref(), 1);
    dax_assignment(lines, &format!("measure {}", quote_name(&measure.name)), &measure.expression, 1);
    if let Some(fmt) = &measure.format_string {
        lines.push(format!("\t\tformatString: {}", fmt));
    }
    if let Some(folder) = &measure.display_folder {
        lines.push(format!("\t\tdisplayFolder: {}", folder));
    }
    if measure.is_hidden {
        lines.push("\t\tisHidden".to_string());
    }
}

fn emit_column(lines: &mut Vec<String>, column: &Column, calculated: bool) {
    lines.push(String::new());
    description(lines, column.description.as_deref(), 1);
    lines.push(format!("\tcolumn {}", quote_name(&column.name)));
    lines.push(format!("\t\tdataType: {}", column.data_type().tmdl_type()));
    if let Some(fmt) = &column.format_string {
        lines.push(format!("\t\tformatString: {}", fmt));
    }
    if column.is_hidden {
        lines.push("\t\tisHidden".to_string());
    }
    if let Some(folder) = &column.display_folder {
        lines.push(format!("\t\tdisplayFolder: {}", folder));
    }
    if let Some(lineage) = &column.source_lineage {
        lines.push(format!("\t\tsourceLineageTag: {}", lineage));
    }
    if let Some(summarize) = column.summarize_by {
        lines.push(format!("\t\tsummarizeBy: {}", summarize));
    }
    if calculated {
        lines.push("\t\tisNameInferred".to_string());
        lines.push(format!("\t\tsourceColumn: [{}]", column.name));
    } else {
        lines.push(format!("\t\tsourceColumn: {}", column.name));
    }
}

fn emit_m_partition(lines: &mut Vec<String>, name: &str, mode: PartitionMode, code: &str) {
    lines.push(String::new());
    lines.push(format!("\tpartition {} = m", quote_name(name)));
    lines.push(format!("\t\tmode: {}", mode));
    m_source(lines, code, 2);
}

fn emit_entity_partition(lines: &mut Vec<String>, name: &str, entity: &EntityRef) {
    lines.push(String::new());
    lines.push(format!("\tpartition {} = entity", quote_name(name)));
    lines.push(format!("\t\tmode: {}", PartitionMode::Entity));
    lines.push("\t\tsource".to_string());
    lines.push(format!("\t\t\tentityName: {}", entity.name));
    if let Some(schema) = &entity.schema {
        lines.push(format!("\t\t\tschemaName: {}", schema));
    }
    if let Some(expression) = &entity.expression_source {
        lines.push(format!("\t\t\texpressionSource: {}", quote_name(expression)));
    }
}

fn emit_calculated_partition(lines: &mut Vec<String>, name: &str, kind: &str, dax: Option<&str>) {
    lines.push(String::new());
    lines.push(format!("\tpartition {} = {}", quote_name(name), kind));
    lines.push("\t\tmode: import".to_string());
    if let Some(dax) = dax {
        dax_assignment(lines, "source", dax, 2);
    }
}

fn emit_calculation_group(lines: &mut Vec<String>, table: &Table) {
    lines.push(String::new());
    lines.push("\tcalculationGroup".to_string());
    if let Some(precedence) = table.calculation_group_precedence {
        lines.push(format!("\t\tprecedence: {}", precedence));
    }
    for item in &table.calculation_items {
        lines.push(String::new());
        description(lines, item.description.as_deref(), 2);
        dax_assignment(lines, &format!("calculationItem {}", quote_name(&item.name)), &item.expression, 2);
        if let Some(ordinal) = item.ordinal {
            lines.push(format!("\t\t\tordinal: {}", ordinal));
        }
        if let Some(fmt) = &item.format_string_expression {
            dax_assignment(lines, "formatStringDefinition", fmt, 3);
        }
    }

    lines.push(String::new());
    lines.push(format!("\tcolumn {}", quote_name(&table.name)));
    lines.push("\t\tdataType: string".to_string());
    lines.push("\t\tsummarizeBy: none".to_string());
    lines.push("\t\tsourceColumn: Name".to_string());
    lines.push("\t\tsortByColumn: Ordinal".to_string());
    lines.push(String::new());
    lines.push("\tcolumn Ordinal".to_string());
    lines.push("\t\tdataType: int64".to_string());
    lines.push("\t\tisHidden".to_string());
    lines.push("\t\tsummarizeBy: sum".to_string());
    lines.push("\t\tsourceColumn: Ordinal".to_string());
}

/// DAX table constructor listing the parameter's fields
pub fn field_parameter_dax(fields: &[FieldParameterEntry]) -> String {
    let rows: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            format!(
                "    (\"{}\", NAMEOF({}), {})",
                f.label().replace('"', "\"\""),
                f.field(),
                i
            )
        })
        .collect();
    format!("{{\n{}\n}}", rows.join(",\n"))
}

fn emit_field_parameter(lines: &mut Vec<String>, table: &Table) {
    let fields_column = format!("{} Fields", table.name);
    let order_column = format!("{} Order", table.name);
    let metadata = serde_json::json!({ "kind": 2, "version": 3 });

    lines.push(String::new());
    lines.push(format!("\tcolumn {}", quote_name(&table.name)));
    lines.push("\t\tdataType: string".to_string());
    lines.push("\t\tsummarizeBy: none".to_string());
    lines.push("\t\tsourceColumn: [Value1]".to_string());
    lines.push(format!("\t\tsortByColumn: {}", quote_name(&order_column)));
    lines.push(String::new());
    lines.push("\t\trelatedColumnDetails".to_string());
    lines.push(format!("\t\t\tgroupByColumn: {}", quote_name(&fields_column)));
    lines.push(String::new());
    lines.push(format!("\tcolumn {}", quote_name(&fields_column)));
    lines.push("\t\tdataType: string".to_string());
    lines.push("\t\tisHidden".to_string());
    lines.push("\t\tsummarizeBy: none".to_string());
    lines.push("\t\tsourceColumn: [Value2]".to_string());
    lines.push(String::new());
    lines.push(format!("\t\textendedProperty ParameterMetadata = {}", metadata));
    lines.push(String::new());
    lines.push(format!("\tcolumn {}", quote_name(&order_column)));
    lines.push("\t\tdataType: int64".to_string());
    lines.push("\t\tisHidden".to_string());
    lines.push("\t\tsummarizeBy: sum".to_string());
    lines.push("\t\tsourceColumn: [Value3]".to_string());
}

/// Render a table file. `partition_code` is the generated M expression for
/// the table's first partition, when it has one that is not an entity.
pub fn emit_table(table: &Table, partition_code: Option<&str>) -> String {
    let mut lines = Vec::new();
    description(&mut lines, table.description.as_deref(), 0);
    lines.push(format!("table {}", quote_name(&table.name)));
    if table.is_hidden {
        lines.push("\tisHidden".to_string());
    }

    for measure in &table.measures {
        emit_measure(&mut lines, measure);
    }

    let calculated = table.kind == TableKind::CalculatedTable;
    for column in &table.columns {
        emit_column(&mut lines, column, calculated);
    }

    match table.kind {
        TableKind::Table => {
            if let Some(partition) = table.primary_partition() {
                match (partition.entity(), partition_code) {
                    (Some(entity), _) => emit_entity_partition(&mut lines, &partition.name, entity),
                    (None, Some(code)) => emit_m_partition(&mut lines, &partition.name, partition.mode, code),
                    (None, None) => {}
                }
            }
        }
        TableKind::MeasureTable => {}
        TableKind::CalculatedTable => {
            let dax = table.calculated.as_ref().and_then(|c| c.expression());
            let name = format!("{}-Partition", table.name);
            emit_calculated_partition(&mut lines, &name, "calculated", dax);
        }
        TableKind::CalculationGroup => {
            emit_calculation_group(&mut lines, table);
            let name = format!("{}-Partition", table.name);
            emit_calculated_partition(&mut lines, &name, "calculationGroup", None);
        }
        TableKind::FieldParameter => {
            emit_field_parameter(&mut lines, table);
            let fields = table
                .field_parameter
                .as_ref()
                .map(|fp| fp.fields.as_slice())
                .unwrap_or_default();
            let name = format!("{}-Partition", table.name);
            emit_calculated_partition(&mut lines, &name, "calculated", Some(&field_parameter_dax(fields)));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_model::ModelSpec;

    fn model() -> ModelBody {
        let yaml = r##"
model:
  name: Sales Model
  tables:
    - name: Fact Sales
      description: Order lines
      columns:
        - { name: Order Date, dataType: date }
        - { name: Amount, dataType: currency, formatString: "#,0.00" }
      measures:
        - { name: Total, expression: "SUM('Fact Sales'[Amount])", displayFolder: Sales }
        - name: Ratio
          expression: |
            DIVIDE(
                [Total],
                CALCULATE([Total], ALL('Fact Sales'))
            )
      partitions:
        - { name: P, use: sf, navigation: A.B.C }
    - name: DimDate
      columns:
        - { name: Order Date, dataType: date }
      partitions:
        - { name: Lake, mode: entity, entity: { name: dim_date, schema: dbo, expressionSource: DatabaseQuery } }
    - name: Time Intelligence
      kind: calculationGroup
      calculationGroupPrecedence: 5
      calculationGroupItems:
        - { name: Current, expression: "SELECTEDMEASURE()", ordinal: 0 }
    - name: Picker
      kind: fieldParameter
      fieldParameter:
        fields: ["[Total]", { label: "Order \"Day\"", field: "'Fact Sales'[Order Date]" }]
  relationships:
    - { from: "'Fact Sales'[Order Date]", to: "DimDate[Order Date]", cardinality: manyToOne, crossFilter: both, isActive: false }
    - { from: "DimDate", to: "'Fact Sales'", cardinality: oneToMany }
"##;
        serde_yaml::from_str::<ModelSpec>(yaml).unwrap().model
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("DimDate"), "DimDate");
        assert_eq!(quote_name("Fact Sales"), "'Fact Sales'");
        assert_eq!(quote_name("O'Brien"), "'O''Brien'");
        assert_eq!(quote_name("2024"), "'2024'");
        assert_eq!(quote_name("a-b"), "'a-b'");
    }

    #[test]
    fn test_emit_model_and_database() {
        let m = model();
        let text = emit_model(&m);
        assert!(text.starts_with("model 'Sales Model'\n\tculture: en-US"));
        assert!(text.contains("ref table 'Fact Sales'\nref table DimDate"));
        assert!(text.contains("ref cultureInfo en-US"));
        assert_eq!(emit_database(&m), "database\n\tcompatibilityLevel: 1567\n");
        assert_eq!(emit_culture(&m), "cultureInfo en-US\n");
    }

    #[test]
    fn test_emit_relationships() {
        let m = model();
        let text = emit_relationships(&m.relationships);
        let expected = "relationship Fact_Sales_Order_Date_DimDate_Order_Date\n\
            \tcrossFilteringBehavior: bothDirections\n\
            \tisActive: false\n\
            \tfromColumn: 'Fact Sales'.'Order Date'\n\
            \ttoColumn: DimDate.'Order Date'\n";
        assert!(text.starts_with(expected), "{}", text);
        assert!(text.contains("\tfromCardinality: one\n\ttoCardinality: many\n\tfromColumn: DimDate.'Order Date'"));
    }

    #[test]
    fn test_emit_table_with_m_partition() {
        let m = model();
        let table = m.get_table("Fact Sales").unwrap();
        let text = emit_table(table, Some("let\n  DB = x\nin\n  DB"));
        assert!(text.starts_with("/// Order lines\ntable 'Fact Sales'\n"));
        assert!(text.contains("\tmeasure Total = SUM('Fact Sales'[Amount])\n\t\tdisplayFolder: Sales"));
        assert!(text.contains("\tmeasure Ratio = ```\n\t\t\tDIVIDE(\n\t\t\t    [Total],"));
        assert!(text.contains("\tcolumn Amount\n\t\tdataType: decimal\n\t\tformatString: #,0.00\n\t\tsourceColumn: Amount"));
        assert!(text.contains("\tpartition P = m\n\t\tmode: import\n\t\tsource =\n\t\t\tlet\n\t\t\t  DB = x\n\t\t\tin\n\t\t\t  DB"));
    }

    #[test]
    fn test_emit_entity_partition() {
        let m = model();
        let text = emit_table(m.get_table("DimDate").unwrap(), None);
        assert!(text.contains(
            "\tpartition Lake = entity\n\t\tmode: directLake\n\t\tsource\n\t\t\tentityName: dim_date\n\t\t\tschemaName: dbo\n\t\t\texpressionSource: DatabaseQuery"
        ));
    }

    #[test]
    fn test_emit_calculation_group() {
        let m = model();
        let text = emit_table(m.get_table("Time Intelligence").unwrap(), None);
        assert!(text.contains("\tcalculationGroup\n\t\tprecedence: 5\n\n\t\tcalculationItem Current = SELECTEDMEASURE()\n\t\t\tordinal: 0"));
        assert!(text.contains("\tpartition 'Time Intelligence-Partition' = calculationGroup"));
    }

    #[test]
    fn test_emit_field_parameter() {
        let m = model();
        let text = emit_table(m.get_table("Picker").unwrap(), None);
        assert!(text.contains("\t\textendedProperty ParameterMetadata = {\"kind\":2,\"version\":3}\n"));
        assert!(text.contains("(\"Total\", NAMEOF([Total]), 0)"));
        assert!(text.contains("(\"Order \"\"Day\"\"\", NAMEOF('Fact Sales'[Order Date]), 1)"));
        assert!(text.contains("\tpartition 'Picker-Partition' = calculated"));
    }
}
