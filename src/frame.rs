//! Column-oriented in-memory table used by the feature pipeline.
//!
//! Every cell is an explicit [`Cell`]; a value that could not be parsed is
//! [`Cell::Missing`] rather than an error, so the missing state flows through
//! later stages like any other value.

use serde::{Serialize, Serializer};

use crate::data::RawValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view used when building model inputs. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(f) => Some(*f),
            Cell::Integer(i) => Some(*i as f64),
            Cell::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Missing | Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Float(f) => f.to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Boolean(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&RawValue> for Cell {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Null => Cell::Missing,
            RawValue::Bool(b) => Cell::Boolean(*b),
            RawValue::Number(n) => Cell::Float(*n),
            RawValue::Text(s) => Cell::Text(s.clone()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Float(f) => serializer.serialize_f64(*f),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Boolean(b) => serializer.serialize_bool(*b),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn filled(name: impl Into<String>, cell: Cell, height: usize) -> Self {
        Self::new(name, vec![cell; height])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    pub fn with_height(height: usize) -> Self {
        Self {
            columns: Vec::new(),
            height,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Appends `column`, or replaces the cells of an existing column with the
    /// same name in place. Short columns are padded with missing cells.
    pub fn upsert(&mut self, mut column: Column) {
        column.cells.resize(self.height, Cell::Missing);
        match self.column_mut(&column.name) {
            Some(existing) => existing.cells = column.cells,
            None => self.columns.push(column),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.column_index(name)?;
        Some(self.columns.remove(idx))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }

    /// Cells of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<(&str, &Cell)> {
        self.columns
            .iter()
            .filter_map(|c| c.cells.get(row).map(|cell| (c.name.as_str(), cell)))
            .collect()
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
