//! Relationship definitions
//!
//! Endpoints use the bracketed-identifier syntax `Table[Column]` or
//! `'Table Name'[Column]`. The table-pair form (`from: Fact`, `to: Dim`)
//! leaves the column to be inferred once the whole model is known.

use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;
use super::types::{Cardinality, CrossFilter};
use crate::error::ValidationError;

/// A fully qualified column reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef { table: table.into(), column: column.into() }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.table, self.column)
    }
}

fn endpoint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:'(?P<qt>[^'\[\]]+)'|(?P<t>[A-Za-z_][\w ]*))\[(?P<c>[A-Za-z_][\w ]*)\]$")
            .expect("Invalid endpoint regex")
    })
}

fn table_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:'(?P<qt>[^'\[\]]+)'|(?P<t>[A-Za-z_][\w ]*))$").expect("Invalid table regex")
    })
}

/// One side of a relationship before column inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Column(ColumnRef),
    /// Table-pair form; the column is inferred
    Table(String),
}

impl Endpoint {
    pub fn table(&self) -> &str {
        match self {
            Endpoint::Column(c) => &c.table,
            Endpoint::Table(t) => t,
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('[') || s.contains(']') {
            let caps = endpoint_regex().captures(s).ok_or_else(|| {
                ValidationError::new(
                    "relationship",
                    format!("endpoint '{}' must be Table[Column] or 'Table'[Column]", s),
                )
            })?;
            let table = caps.name("qt").or_else(|| caps.name("t")).map_or("", |m| m.as_str());
            return Ok(Endpoint::Column(ColumnRef::new(table.trim_end(), caps["c"].trim_end())));
        }

        let caps = table_regex().captures(s).ok_or_else(|| {
            ValidationError::new("relationship", format!("endpoint '{}' is not a table name", s))
        })?;
        let table = caps.name("qt").or_else(|| caps.name("t")).map_or("", |m| m.as_str());
        Ok(Endpoint::Table(table.trim_end().to_string()))
    }
}

/// Raw relationship as written in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipDef {
    pub name: Option<String>,
    pub from: String,
    pub to: String,
    pub cardinality: Cardinality,
    #[serde(rename = "crossFilter", default)]
    pub cross_filter: CrossFilter,
    #[serde(rename = "isActive", default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A validated relationship with both columns resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub from: ColumnRef,
    pub to: ColumnRef,
    pub cardinality: Cardinality,
    pub cross_filter: CrossFilter,
    pub is_active: bool,
}

impl Relationship {
    /// Resolve a raw definition. `columns_of` returns the declared column
    /// names of a table, or `None` when the table is unknown.
    pub fn resolve<'a, F>(def: RelationshipDef, columns_of: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<Vec<&'a str>>,
    {
        let context = format!("relationship {} -> {}", def.from, def.to);
        let from: Endpoint = def.from.parse().map_err(|e: ValidationError| ValidationError::new(&context, e.message))?;
        let to: Endpoint = def.to.parse().map_err(|e: ValidationError| ValidationError::new(&context, e.message))?;

        let from_columns = columns_of(from.table())
            .ok_or_else(|| ValidationError::new(&context, format!("unknown table '{}'", from.table())))?;
        let to_columns = columns_of(to.table())
            .ok_or_else(|| ValidationError::new(&context, format!("unknown table '{}'", to.table())))?;

        let (from, to) = match (from, to) {
            (Endpoint::Column(f), Endpoint::Column(t)) => (f, t),
            (Endpoint::Table(f), Endpoint::Table(t)) => {
                let shared: Vec<&str> = from_columns
                    .iter()
                    .copied()
                    .filter(|c| to_columns.contains(c))
                    .collect();
                match shared.as_slice() {
                    [column] => (ColumnRef::new(f, *column), ColumnRef::new(t, *column)),
                    [] => {
                        return Err(ValidationError::new(
                            &context,
                            "no column name is shared by both tables; use Table[Column] endpoints",
                        ))
                    }
                    many => {
                        return Err(ValidationError::new(
                            &context,
                            format!("ambiguous join columns: {}", many.join(", ")),
                        ))
                    }
                }
            }
            _ => {
                return Err(ValidationError::new(
                    &context,
                    "both endpoints must use the same form (Table[Column] or table names)",
                ))
            }
        };

        let name = def
            .name
            .unwrap_or_else(|| format!("{}_{}_{}_{}", from.table, from.column, to.table, to.column))
            .replace(' ', "_");

        Ok(Relationship {
            name,
            from,
            to,
            cardinality: def.cardinality,
            cross_filter: def.cross_filter,
            is_active: def.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(table: &str) -> Option<Vec<&'static str>> {
        match table {
            "FactSales" => Some(vec!["OrderDate", "ProductKey", "Amount"]),
            "DimDate" => Some(vec!["Date", "Year"]),
            "DimProduct" => Some(vec!["ProductKey", "Name"]),
            "Fact Sales" => Some(vec!["Order Date"]),
            "Dim Date" => Some(vec!["Order Date"]),
            _ => None,
        }
    }

    fn def(from: &str, to: &str) -> RelationshipDef {
        RelationshipDef {
            name: None,
            from: from.into(),
            to: to.into(),
            cardinality: Cardinality::ManyToOne,
            cross_filter: CrossFilter::Single,
            is_active: true,
        }
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(
            "FactSales[OrderDate]".parse::<Endpoint>().unwrap(),
            Endpoint::Column(ColumnRef::new("FactSales", "OrderDate"))
        );
        assert_eq!(
            "'Fact Sales'[Order Date]".parse::<Endpoint>().unwrap(),
            Endpoint::Column(ColumnRef::new("Fact Sales", "Order Date"))
        );
        assert_eq!("DimDate".parse::<Endpoint>().unwrap(), Endpoint::Table("DimDate".into()));
    }

    #[test]
    fn test_reject_nested_brackets() {
        assert!("Fact[Col]]".parse::<Endpoint>().is_err());
        assert!("Fact[[Col]".parse::<Endpoint>().is_err());
        assert!("'Fa[ct'[Col]".parse::<Endpoint>().is_err());
        assert!("Fact[]".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_resolve_explicit() {
        let rel = Relationship::resolve(def("FactSales[OrderDate]", "DimDate[Date]"), columns).unwrap();
        assert_eq!(rel.from, ColumnRef::new("FactSales", "OrderDate"));
        assert_eq!(rel.to.to_string(), "DimDate[Date]");
        assert_eq!(rel.name, "FactSales_OrderDate_DimDate_Date");
    }

    #[test]
    fn test_infer_column_from_table_pair() {
        let rel = Relationship::resolve(def("FactSales", "DimProduct"), columns).unwrap();
        assert_eq!(rel.from.column, "ProductKey");
        assert_eq!(rel.to.column, "ProductKey");
    }

    #[test]
    fn test_infer_with_quoted_tables() {
        let rel = Relationship::resolve(def("'Fact Sales'", "'Dim Date'"), columns).unwrap();
        assert_eq!(rel.from, ColumnRef::new("Fact Sales", "Order Date"));
        assert_eq!(rel.name, "Fact_Sales_Order_Date_Dim_Date_Order_Date");
    }

    #[test]
    fn test_infer_without_shared_column() {
        let err = Relationship::resolve(def("FactSales", "DimDate"), columns).unwrap_err();
        assert!(err.message.contains("shared"));
    }

    #[test]
    fn test_unknown_table() {
        let err = Relationship::resolve(def("Nope[A]", "DimDate[Date]"), columns).unwrap_err();
        assert!(err.message.contains("unknown table 'Nope'"));
    }

    #[test]
    fn test_mixed_forms() {
        assert!(Relationship::resolve(def("FactSales", "DimDate[Date]"), columns).is_err());
    }
}
