//! Specification parser (verb module)
//!
//! Transforms YAML files into validated model types.

use serde::de::DeserializeOwned;
use std::path::Path;
use crate::error::ParseError;
use crate::semantic_model::{ModelSpec, SourcesSpec};

fn read_file<P: AsRef<Path>>(path: P) -> Result<String, ParseError> {
    let path_str = path.as_ref().display().to_string();
    std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })
}

fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse a model document from a YAML file
pub fn parse_model_file<P: AsRef<Path>>(path: P) -> Result<ModelSpec, ParseError> {
    parse_model_str(&read_file(path)?)
}

/// Parse a model document from a YAML string
pub fn parse_model_str(yaml: &str) -> Result<ModelSpec, ParseError> {
    parse_yaml(yaml)
}

/// Parse a sources document from a YAML file
pub fn parse_sources_file<P: AsRef<Path>>(path: P) -> Result<SourcesSpec, ParseError> {
    parse_sources_str(&read_file(path)?)
}

/// Parse a sources document from a YAML string
pub fn parse_sources_str(yaml: &str) -> Result<SourcesSpec, ParseError> {
    parse_yaml(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_model::{PartitionSource, SourceKind, TableKind};

    #[test]
    fn test_parse_sales_model() {
        let spec = parse_model_file("tests/test_data/sales/model.yaml").unwrap();
        let model = &spec.model;
        assert_eq!(model.name, "SalesModel");

        let dim_date = model.get_table("DimDate").unwrap();
        assert_eq!(dim_date.kind, TableKind::Table);
        let partition = dim_date.primary_partition().unwrap();
        assert!(matches!(&partition.source, PartitionSource::Navigation { source, .. } if source == "sf_main"));

        let measures = model.get_table("Measures").unwrap();
        assert_eq!(measures.kind, TableKind::MeasureTable);
        assert!(measures.measures.iter().any(|m| m.name == "sum_SalesAmount"));

        assert!(!model.relationships.is_empty());
    }

    #[test]
    fn test_parse_sales_sources() {
        let sources = parse_sources_file("tests/test_data/sales/sources.yaml").unwrap();
        assert_eq!(sources.get("sf_main").unwrap().kind, SourceKind::Snowflake);
        assert_eq!(sources.get("finance_xlsx").unwrap().kind, SourceKind::Excel);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(parse_model_str("not: [valid: yaml").is_err());
    }

    #[test]
    fn test_validation_error_names_table() {
        let yaml = r#"
model:
  name: M
  tables:
    - name: Broken
      kind: measureTable
"#;
        let err = parse_model_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_sources_file("tests/test_data/does_not_exist.yaml").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
