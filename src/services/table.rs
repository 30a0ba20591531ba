use crate::error::AppError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A single cell value. Loaders produce the most specific representation
/// they can; the classifier works on whatever arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one. Strings are parsed,
    /// booleans count as 0/1. Parse failure is a negative signal, not an
    /// error.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Canonical string form, used for unique-value counting, category
    /// tallies and sample previews. Nulls render empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// One named column of raw values. Immutable once the table is built.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// An ordered set of equal-length named columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting ragged columns and duplicate names.
    pub fn new(columns: Vec<Column>) -> Result<Self, AppError> {
        if let Some(first) = columns.first() {
            let row_count = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
                return Err(AppError::InvalidInput(format!(
                    "Column '{}' has {} rows, expected {}",
                    bad.name(),
                    bad.len(),
                    row_count
                )));
            }
        }
        for (idx, col) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name() == col.name()) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate column name '{}'",
                    col.name()
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Narrow the table to the named columns, in the order given. This is
    /// the validation path for every column selection: an empty selection
    /// or an unknown name is the caller's mistake, not a degenerate input.
    pub fn select(&self, names: &[String]) -> Result<Table, AppError> {
        if names.is_empty() {
            return Err(AppError::InvalidInput(
                "No columns selected".to_string(),
            ));
        }
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let col = self.column(name).ok_or_else(|| {
                AppError::InvalidInput(format!("Unknown column: '{}'", name))
            })?;
            selected.push(col.clone());
        }
        Table::new(selected)
    }

    /// First `limit` rows rendered to strings, for preview payloads.
    pub fn sample_rows(&self, limit: usize) -> Vec<Vec<String>> {
        (0..self.row_count().min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.values()[row].to_string())
                    .collect()
            })
            .collect()
    }
}

/// The six semantic column types the classifier can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Text,
    Other,
}
