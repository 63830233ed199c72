//! Power Query M generation (verb module)
//!
//! Turns a table's first partition into a single `let … in` expression:
//! connection, navigation or native query, column projection, type
//! coercion, then the partition's custom steps in order.

mod builder;
mod error;
pub mod lexer;
pub mod source;

pub use builder::{generate_partition_mcode, PartitionBuilder};
pub use error::BuildError;

use std::fmt;

const INDENT: &str = "  ";

/// One `name = expression` step of a `let` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub expr: String,
}

impl Binding {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Binding {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

impl fmt::Display for Binding {
    /// Single-line expressions stay on the binding line; multi-line ones
    /// start on the next line, indented one level deeper.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.expr.contains('\n') {
            return write!(f, "{}{} = {}", INDENT, self.name, self.expr);
        }
        write!(f, "{}{} =", INDENT, self.name)?;
        for line in self.expr.lines() {
            if line.trim().is_empty() {
                writeln!(f)?;
            } else {
                write!(f, "\n{}{}{}", INDENT, INDENT, line)?;
            }
        }
        Ok(())
    }
}

/// Re-base a snippet body so its continuation lines keep their relative
/// indentation with the shallowest one at column zero
pub(crate) fn dedent(body: &str) -> String {
    let mut lines = body.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let margin = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = first.to_string();
    for line in rest {
        out.push('\n');
        if !line.trim().is_empty() {
            out.push_str(line.get(margin..).unwrap_or(line.trim_start()).trim_end());
        }
    }
    out
}
