//! Column definitions

use serde::Deserialize;
use super::types::{DataType, SummarizeBy};

/// A declared table column
#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: DataType,
    #[serde(rename = "formatString")]
    pub format_string: Option<String>,
    #[serde(rename = "isHidden", default)]
    pub is_hidden: bool,
    pub description: Option<String>,
    #[serde(rename = "displayFolder")]
    pub display_folder: Option<String>,
    /// Aggregation-default hint
    #[serde(rename = "summarizeBy")]
    pub summarize_by: Option<SummarizeBy>,
    /// `Table[Column]` this column is derived from (calculated tables)
    #[serde(rename = "sourceLineage")]
    pub source_lineage: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            format_string: None,
            is_hidden: false,
            description: None,
            display_folder: None,
            summarize_by: None,
            source_lineage: None,
        }
    }

    /// Get the data type of this column
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
