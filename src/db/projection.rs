//! Field projection: flattens a sparse catalog entry into an ordered list of
//! storage columns and values.
//!
//! The same projection drives read filters and write assignments. The
//! field-to-column table is declared statically in [`project`], in a fixed
//! order, so the resulting list never depends on container iteration order.

use std::fmt;

use super::models::{Field, PartialEntry, ReleaseDate};

/// Storage column addressable through a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    GroupName,
    SongName,
    ReleaseDate,
    Text,
    Link,
}

impl Column {
    /// Key of the column in the joined catalog query.
    pub fn key(self) -> &'static str {
        match self {
            Column::GroupName => "groups.name",
            Column::SongName => "songs.name",
            Column::ReleaseDate => "release_date",
            Column::Text => "text",
            Column::Link => "link",
        }
    }

    /// Bare column name inside its owning table.
    pub fn name(self) -> &'static str {
        match self {
            Column::GroupName | Column::SongName => "name",
            Column::ReleaseDate => "release_date",
            Column::Text => "text",
            Column::Link => "link",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A non-empty projected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Date(ReleaseDate),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d),
        }
    }
}

/// Ordered column/value pairs produced by [`project`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    assignments: Vec<(Column, Value)>,
    cleared: Vec<Column>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn assignments(&self) -> &[(Column, Value)] {
        &self.assignments
    }

    /// Columns the caller supplied empty. They never appear in `assignments`.
    pub fn cleared(&self) -> &[Column] {
        &self.cleared
    }

    /// Joined-query keys of the assigned columns, in order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.assignments.iter().map(|(c, _)| c.key()).collect()
    }

    /// Remove a column from the projection, returning its value.
    pub fn take(&mut self, column: Column) -> Option<Value> {
        let pos = self.assignments.iter().position(|(c, _)| *c == column)?;
        Some(self.assignments.remove(pos).1)
    }

    fn push_text(&mut self, column: Column, field: &Field<String>) {
        match field {
            Field::Value(v) if !v.is_empty() => {
                self.assignments.push((column, Value::Text(v.clone())))
            }
            Field::Value(_) | Field::Cleared => self.cleared.push(column),
            Field::Absent => {}
        }
    }

    fn push_date(&mut self, column: Column, field: &Field<ReleaseDate>) {
        match field {
            Field::Value(d) => self.assignments.push((column, Value::Date(*d))),
            Field::Cleared => self.cleared.push(column),
            Field::Absent => {}
        }
    }
}

/// Project a sparse entry into its non-empty storage columns.
pub fn project(entry: &PartialEntry) -> Projection {
    let mut projection = Projection::default();
    projection.push_text(Column::GroupName, &entry.group);
    projection.push_text(Column::SongName, &entry.song);
    projection.push_date(Column::ReleaseDate, &entry.release_date);
    projection.push_text(Column::Text, &entry.text);
    projection.push_text(Column::Link, &entry.link);
    projection
}
