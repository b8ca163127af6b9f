//! Parameterized clause construction from projected columns.
//!
//! Placeholders use SQLite's numbered form (`?N`). Numbering is contiguous
//! and follows the order of the input pairs, so `args[i]` always binds to
//! placeholder `start + i`.

use super::projection::{Column, Value};

/// SQL fragment plus the positional arguments it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub sql: String,
    pub args: Vec<Value>,
    /// Index of the first placeholder in `sql`.
    pub start: usize,
}

impl Clause {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Index the next placeholder after this clause should use.
    pub fn next_index(&self) -> usize {
        self.start + self.args.len()
    }

    /// `WHERE ...` prefix, or an empty string when there are no predicates.
    pub fn where_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.sql)
        }
    }
}

/// Render placeholder number `index`.
pub fn placeholder(index: usize) -> String {
    format!("?{}", index)
}

/// Build an `AND`-joined equality filter over joined catalog columns.
///
/// Numbering starts at 1. An empty input yields an empty clause that
/// matches every row.
pub fn build_where(pairs: &[(Column, Value)]) -> Clause {
    build(pairs, 1, " AND ", Column::key)
}

/// Build a comma-joined assignment list over bare column names.
///
/// Numbering starts at `start`. Callers must skip the `UPDATE` entirely when
/// the result is empty.
pub fn build_set(pairs: &[(Column, Value)], start: usize) -> Clause {
    build(pairs, start, ", ", Column::name)
}

fn build(
    pairs: &[(Column, Value)],
    start: usize,
    separator: &str,
    column_name: fn(Column) -> &'static str,
) -> Clause {
    let fragments: Vec<String> = pairs
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = {}", column_name(*column), placeholder(start + i)))
        .collect();

    Clause {
        sql: fragments.join(separator),
        args: pairs.iter().map(|(_, value)| value.clone()).collect(),
        start,
    }
}
