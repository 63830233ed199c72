//! Data type and enumeration definitions for the semantic model

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Column data types understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer
    Int64,
    /// Fixed decimal
    Decimal,
    /// Floating point
    Double,
    Boolean,
    String,
    Date,
    DateTime,
    Time,
    Currency,
    /// Anything else
    Variant,
}

impl Default for DataType {
    fn default() -> Self {
        DataType::String
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "int64"),
            DataType::Decimal => write!(f, "decimal"),
            DataType::Double => write!(f, "double"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::String => write!(f, "string"),
            DataType::Date => write!(f, "date"),
            DataType::DateTime => write!(f, "dateTime"),
            DataType::Time => write!(f, "time"),
            DataType::Currency => write!(f, "currency"),
            DataType::Variant => write!(f, "variant"),
        }
    }
}

/// Error when parsing a data type string
#[derive(Debug, Clone)]
pub struct ParseDataTypeError {
    pub input: String,
}

impl fmt::Display for ParseDataTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown data type '{}'. Valid options: int64, decimal, double, boolean, string, date, dateTime, time, currency, variant",
            self.input
        )
    }
}

impl std::error::Error for ParseDataTypeError {}

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int64" | "integer" | "int" | "i64" | "whole" => Ok(DataType::Int64),
            "decimal" | "fixed" => Ok(DataType::Decimal),
            "double" | "float" | "f64" | "number" => Ok(DataType::Double),
            "boolean" | "bool" | "logical" => Ok(DataType::Boolean),
            "string" | "text" => Ok(DataType::String),
            "date" => Ok(DataType::Date),
            "datetime" | "timestamp" => Ok(DataType::DateTime),
            "time" => Ok(DataType::Time),
            "currency" => Ok(DataType::Currency),
            "variant" | "any" => Ok(DataType::Variant),
            _ => Err(ParseDataTypeError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl DataType {
    /// Power Query M type literal used by `Table.TransformColumnTypes`
    pub fn m_type(&self) -> &'static str {
        match self {
            DataType::Int64 => "Int64.Type",
            DataType::Decimal | DataType::Double => "Number.Type",
            DataType::Boolean => "Logical.Type",
            DataType::String => "Text.Type",
            DataType::Date => "Date.Type",
            DataType::DateTime => "DateTime.Type",
            DataType::Time => "Time.Type",
            DataType::Currency => "Currency.Type",
            DataType::Variant => "Any.Type",
        }
    }

    /// TMDL `dataType:` value.
    ///
    /// TMDL has no currency or time type; currency is stored as decimal and
    /// time as dateTime.
    pub fn tmdl_type(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Decimal | DataType::Currency => "decimal",
            DataType::Double => "double",
            DataType::Boolean => "boolean",
            DataType::String => "string",
            DataType::Date | DataType::DateTime | DataType::Time => "dateTime",
            DataType::Variant => "variant",
        }
    }

    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int64 | DataType::Decimal | DataType::Double | DataType::Currency
        )
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// DAX aggregation functions accepted by the `base_measures` shorthand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Sum,
    Average,
    Min,
    Max,
    Count,
    CountA,
    CountRows,
    DistinctCount,
    Median,
}

/// Error when parsing an aggregation string
#[derive(Debug, Clone)]
pub struct ParseAggregationError {
    pub input: String,
}

impl fmt::Display for ParseAggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown aggregation '{}'. Valid options: sum, avg, min, max, count, counta, countrows, distinctcount, median",
            self.input
        )
    }
}

impl std::error::Error for ParseAggregationError {}

impl FromStr for Aggregation {
    type Err = ParseAggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" => Ok(Aggregation::Average),
            "min" | "minimum" => Ok(Aggregation::Min),
            "max" | "maximum" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            "counta" => Ok(Aggregation::CountA),
            "countrows" => Ok(Aggregation::CountRows),
            "distinctcount" | "distinct_count" | "count_distinct" => Ok(Aggregation::DistinctCount),
            "median" => Ok(Aggregation::Median),
            _ => Err(ParseAggregationError { input: s.to_string() }),
        }
    }
}

impl Aggregation {
    /// DAX function name
    pub fn dax_function(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Average => "AVERAGE",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Count => "COUNT",
            Aggregation::CountA => "COUNTA",
            Aggregation::CountRows => "COUNTROWS",
            Aggregation::DistinctCount => "DISTINCTCOUNT",
            Aggregation::Median => "MEDIAN",
        }
    }
}

// ============================================================================
// Small closed enumerations
// ============================================================================

/// How generated partition code treats source columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Project exactly the declared columns
    #[default]
    SelectOnly,
    /// Pass every source column through
    KeepAll,
    /// Pass everything through, undeclared columns hidden
    HideExtras,
}

/// Default aggregation a client applies to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummarizeBy {
    None,
    Sum,
    Average,
    Min,
    Max,
    Count,
    DistinctCount,
}

impl fmt::Display for SummarizeBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeBy::None => write!(f, "none"),
            SummarizeBy::Sum => write!(f, "sum"),
            SummarizeBy::Average => write!(f, "average"),
            SummarizeBy::Min => write!(f, "min"),
            SummarizeBy::Max => write!(f, "max"),
            SummarizeBy::Count => write!(f, "count"),
            SummarizeBy::DistinctCount => write!(f, "distinctCount"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossFilter {
    #[default]
    Single,
    Both,
}
