//! Measure types and the `base_measures` shorthand

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use super::types::Aggregation;
use crate::error::ValidationError;

/// A DAX measure
#[derive(Debug, Clone, Deserialize)]
pub struct Measure {
    pub name: String,
    pub expression: String,
    #[serde(rename = "formatString")]
    pub format_string: Option<String>,
    #[serde(rename = "displayFolder")]
    pub display_folder: Option<String>,
    #[serde(rename = "isHidden", default)]
    pub is_hidden: bool,
    pub description: Option<String>,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            format_string: None,
            display_folder: None,
            is_hidden: false,
            description: None,
        }
    }
}

/// Declarative bulk measures.
///
/// Either a mapping `{sum: "t.a, t.b", avg: "c.r"}` or the list form
/// `[{sum: "t.a, t.b"}, {avg: "c.r"}]`. Column lists may also be YAML
/// sequences.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BaseMeasures {
    Map(Mapping),
    List(Vec<Mapping>),
}

impl BaseMeasures {
    /// Expand into one measure per (function, column) pair, in document order
    pub fn expand(&self, table: &str) -> Result<Vec<Measure>, ValidationError> {
        let mappings: Vec<&Mapping> = match self {
            BaseMeasures::Map(m) => vec![m],
            BaseMeasures::List(list) => list.iter().collect(),
        };

        let context = format!("table '{}' base_measures", table);
        let mut measures = Vec::new();
        for mapping in mappings {
            for (key, value) in mapping {
                let function = key
                    .as_str()
                    .ok_or_else(|| ValidationError::new(&context, "aggregation keys must be strings"))?;
                let aggregation = function
                    .parse::<Aggregation>()
                    .map_err(|e| ValidationError::new(&context, e.to_string()))?;

                for column_spec in column_specs(value, &context)? {
                    measures.push(base_measure(function, aggregation, &column_spec));
                }
            }
        }
        Ok(measures)
    }
}

fn column_specs(value: &Value, context: &str) -> Result<Vec<String>, ValidationError> {
    let raw: Vec<String> = match value {
        Value::String(s) => s.split(',').map(|p| p.to_string()).collect(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::new(context, "column references must be strings"))
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(ValidationError::new(
                context,
                "expected a comma-separated string or a list of column references",
            ))
        }
    };

    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// `sum` + `fact.amount` -> `sum_amount = SUM('fact'[amount])`
fn base_measure(function: &str, aggregation: Aggregation, column_spec: &str) -> Measure {
    let (table, column) = match column_spec.split_once('.') {
        Some((t, c)) => (Some(t.trim()), c.trim()),
        None => (None, column_spec),
    };

    let column_ref = match table {
        Some(t) => format!("'{}'[{}]", t.replace('\'', "''"), column),
        None => format!("[{}]", column),
    };

    Measure::new(
        format!("{}_{}", function, column),
        format!("{}({})", aggregation.dax_function(), column_ref),
    )
}
