use crate::services::table::{Column, SemanticType, Value};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// A numeric column with at most this many distinct values, covering less
/// than `NUMERIC_DOWNGRADE_RATIO` of the rows, behaves like a category for
/// charting (e.g. a 1-5 rating code). Thresholds are load-bearing; do not
/// re-tune.
const NUMERIC_DOWNGRADE_MAX_UNIQUE: usize = 10;
const NUMERIC_DOWNGRADE_RATIO: f64 = 0.05;

const CATEGORICAL_MAX_UNIQUE: usize = 20;
const CATEGORICAL_UNIQUE_RATIO: f64 = 0.05;
/// Many distinct but short labels (mean length at or under this) still read
/// as categories; longer strings read as free text.
const SHORT_LABEL_MEAN_LEN: f64 = 10.0;
const SHORT_LABEL_MIN_UNIQUE: usize = 10;

static BOOLEAN_TOKENS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["true", "false", "yes", "no", "y", "n", "1", "0"]
        .into_iter()
        .collect()
});

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

static DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
];

/// Try the known datetime formats, then the date-only ones at midnight.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d.and_time(chrono::NaiveTime::MIN));
        }
    }
    None
}

/// Datetime view of a value: native, or a parseable string.
pub(crate) fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Str(s) => parse_datetime(s),
        _ => None,
    }
}

/// Whether the value is one of the closed set of boolean representations:
/// a native bool, numeric 0/1, or one of the literal tokens (case-sensitive
/// as given).
fn is_boolean_value(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Int(v) => *v == 0 || *v == 1,
        Value::Float(v) => *v == 0.0 || *v == 1.0,
        Value::Str(s) => BOOLEAN_TOKENS.contains(s.as_str()),
        _ => false,
    }
}

fn is_numeric_value(value: &Value) -> bool {
    value.as_f64().is_some()
}

fn is_datetime_value(value: &Value) -> bool {
    as_datetime(value).is_some()
}

fn is_string_typed(non_null: &[&Value]) -> bool {
    non_null.iter().all(|v| matches!(v, Value::Str(_)))
}

fn distinct_count(non_null: &[&Value]) -> usize {
    non_null
        .iter()
        .map(|v| v.to_string())
        .collect::<HashSet<_>>()
        .len()
}

fn mean_string_length(non_null: &[&Value]) -> f64 {
    if non_null.is_empty() {
        return 0.0;
    }
    let total: usize = non_null
        .iter()
        .map(|v| v.to_string().chars().count())
        .sum();
    total as f64 / non_null.len() as f64
}

pub(crate) fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn is_categorical(non_null: &[&Value], row_count: usize) -> bool {
    if !is_string_typed(non_null) {
        return false;
    }
    let unique_count = distinct_count(non_null);
    if unique_count > SHORT_LABEL_MIN_UNIQUE
        && mean_string_length(non_null) <= SHORT_LABEL_MEAN_LEN
    {
        return true;
    }
    safe_divide(unique_count as f64, row_count as f64) < CATEGORICAL_UNIQUE_RATIO
        || unique_count <= CATEGORICAL_MAX_UNIQUE
}

fn is_text(non_null: &[&Value]) -> bool {
    is_string_typed(non_null) && mean_string_length(non_null) > SHORT_LABEL_MEAN_LEN
}

/// Assign exactly one semantic type to a column. Check order is
/// load-bearing: boolean wins over numeric (a yes/no column must not become
/// categorical), numeric wins over datetime (epoch-like integers stay
/// numeric), and the numeric-to-categorical downgrade fires before datetime
/// is ever probed. A column with no non-null values is `other` without any
/// parse probing.
pub fn classify(column: &Column) -> SemanticType {
    let non_null: Vec<&Value> = column.non_null().collect();
    if non_null.is_empty() {
        return SemanticType::Other;
    }

    if non_null.iter().all(|v| is_boolean_value(v)) {
        return SemanticType::Boolean;
    }

    if non_null.iter().all(|v| is_numeric_value(v)) {
        let unique_count = distinct_count(&non_null);
        let ratio = safe_divide(unique_count as f64, column.len() as f64);
        if unique_count <= NUMERIC_DOWNGRADE_MAX_UNIQUE && ratio < NUMERIC_DOWNGRADE_RATIO {
            return SemanticType::Categorical;
        }
        return SemanticType::Numeric;
    }

    if non_null.iter().all(|v| is_datetime_value(v)) {
        return SemanticType::Datetime;
    }

    if is_categorical(&non_null, column.len()) {
        return SemanticType::Categorical;
    }

    if is_text(&non_null) {
        return SemanticType::Text;
    }

    SemanticType::Other
}
