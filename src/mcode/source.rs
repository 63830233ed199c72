//! Source connection resolver
//!
//! Produces the M expressions that open a source and, for warehouse
//! sources, scope it to one database.

use super::error::BuildError;
use super::lexer::quote;
use super::Binding;
use crate::semantic_model::{Source, SourceKind};

/// Variable bound to the database-scoped value
pub const DATABASE_VAR: &str = "DB";
/// Variable bound to the database collection when filtering by name
pub const COLLECTION_VAR: &str = "SourceColl";

fn server(source: &Source) -> &str {
    source.server.as_deref().unwrap_or_default()
}

/// Trailing options record for `Snowflake.Databases`, if any option is set
fn snowflake_options(source: &Source) -> Option<String> {
    let mut fields = Vec::new();
    if let Some(role) = source.role.as_deref().filter(|r| !r.is_empty()) {
        fields.push(format!("Role = {}", quote(role)));
    }
    if let Some(implementation) = source.options.implementation.as_deref() {
        fields.push(format!("Implementation = {}", quote(implementation)));
    }
    if let Some(tag) = source.options.query_tag.as_deref() {
        fields.push(format!("QueryTag = {}", quote(tag)));
    }
    if fields.is_empty() {
        None
    } else {
        Some(format!("[{}]", fields.join(", ")))
    }
}

/// Connection call returning the database collection of a warehouse source
pub fn collection_call(source: &Source, key: &str) -> Result<String, BuildError> {
    match source.kind {
        SourceKind::Snowflake => {
            let mut args = vec![quote(server(source))];
            let options = snowflake_options(source);
            match (source.warehouse.as_deref(), &options) {
                (Some(wh), _) => args.push(quote(wh)),
                (None, Some(_)) => args.push("null".to_string()),
                (None, None) => {}
            }
            args.extend(options);
            Ok(format!("Snowflake.Databases({})", args.join(", ")))
        }
        SourceKind::SqlServer => Ok(format!("Sql.Databases({})", quote(server(source)))),
        kind => Err(BuildError::UnsupportedNavigation {
            source: key.to_string(),
            kind,
        }),
    }
}

fn select_database(collection: &str, database: &str) -> String {
    format!("{}{{[Name = {}, Kind = \"Database\"]}}[Data]", collection, quote(database))
}

/// Connection call already scoped to `database`
pub fn database_call(source: &Source, key: &str, database: &str) -> Result<String, BuildError> {
    match source.kind {
        SourceKind::SqlServer => Ok(format!(
            "Sql.Database({}, {})",
            quote(server(source)),
            quote(database)
        )),
        _ => Ok(select_database(&collection_call(source, key)?, database)),
    }
}

/// Bindings that leave `DB` scoped to the requested database.
///
/// `requested` is the partition's navigation database; the source default
/// applies when it is absent. When the requested database is the source
/// default a single `DB` binding is emitted, otherwise the collection is
/// bound first and filtered by name.
pub fn resolve_database(
    source: &Source,
    key: &str,
    partition: &str,
    requested: Option<&str>,
) -> Result<Vec<Binding>, BuildError> {
    if !source.kind.is_warehouse() {
        return Err(BuildError::UnsupportedNavigation {
            source: key.to_string(),
            kind: source.kind,
        });
    }

    let default = source.database.as_deref();
    let database = requested
        .or(default)
        .ok_or_else(|| BuildError::MissingDatabase {
            partition: partition.to_string(),
            source: key.to_string(),
        })?;

    if default == Some(database) {
        return Ok(vec![Binding::new(DATABASE_VAR, database_call(source, key, database)?)]);
    }

    Ok(vec![
        Binding::new(COLLECTION_VAR, collection_call(source, key)?),
        Binding::new(DATABASE_VAR, select_database(COLLECTION_VAR, database)),
    ])
}

/// Complete `let … in` access expression for a source used without
/// navigation or a native query
pub fn standard_template(source: &Source, key: &str) -> Result<String, BuildError> {
    let mut lines: Vec<String> = Vec::new();
    let result = match source.kind {
        SourceKind::Snowflake | SourceKind::SqlServer => {
            lines.push(format!("Source = {}", collection_call(source, key)?));
            match source.database.as_deref() {
                Some(db) => {
                    lines.push(format!("Database = {}", select_database("Source", db)));
                    "Database"
                }
                None => "Source",
            }
        }
        SourceKind::Excel => {
            let path = source.file_path.as_deref().unwrap_or_default();
            let item = source.workbook_name.as_deref().unwrap_or_default();
            let item_kind = source
                .options
                .get_str("item_kind")
                .unwrap_or_else(|| "Sheet".to_string());
            lines.push(format!(
                "Source = Excel.Workbook(File.Contents({}), null, true)",
                quote(path)
            ));
            lines.push(format!(
                "Item = Source{{[Item = {}, Kind = {}]}}[Data]",
                quote(item),
                quote(&item_kind)
            ));
            if item_kind == "Sheet" {
                lines.push("Promoted = Table.PromoteHeaders(Item, [PromoteAllScalars = true])".to_string());
                "Promoted"
            } else {
                "Item"
            }
        }
        SourceKind::Csv => {
            let path = source.file_path.as_deref().unwrap_or_default();
            let delimiter = source.options.get_str("delimiter").unwrap_or_else(|| ",".to_string());
            let encoding = source.options.get_str("encoding").unwrap_or_else(|| "65001".to_string());
            lines.push(format!(
                "Source = Csv.Document(File.Contents({}), [Delimiter = {}, Encoding = {}, QuoteStyle = QuoteStyle.Csv])",
                quote(path),
                quote(&delimiter),
                encoding
            ));
            lines.push("Promoted = Table.PromoteHeaders(Source, [PromoteAllScalars = true])".to_string());
            "Promoted"
        }
    };

    Ok(format!("let\n  {}\nin\n  {}", lines.join(",\n  "), result))
}

/// Split a single-line-per-binding `let … in` template into its bindings and
/// returned variable
pub fn parse_template(template: &str) -> (Vec<Binding>, Option<String>) {
    let mut bindings = Vec::new();
    let mut result = None;
    let mut in_body = false;

    for line in template.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "let" {
            in_body = true;
        } else if trimmed == "in" {
            in_body = false;
        } else if in_body {
            let definition = trimmed.strip_suffix(',').unwrap_or(trimmed);
            if let Some((name, expr)) = definition.split_once('=') {
                bindings.push(Binding::new(name.trim(), expr.trim()));
            }
        } else if result.is_none() {
            result = Some(trimmed.to_string());
        }
    }

    (bindings, result)
}
