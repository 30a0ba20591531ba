use super::classify::{as_datetime, safe_divide};
use crate::services::table::{Column, SemanticType, Value};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Statistics for one column: base fields for every type, plus the detail
/// record matching the assigned semantic type. Degenerate data (all-null,
/// zero rows, zero variance) produces zero/None fields, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub unique_percentage: f64,
    #[serde(flatten)]
    pub details: TypeStatistics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeStatistics {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
    Datetime(DatetimeStats),
    Boolean(BooleanStats),
    Text(TextStats),
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation; None below two values.
    pub std: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalStats {
    pub most_common: Option<String>,
    pub most_common_count: usize,
    pub least_common: Option<String>,
    pub least_common_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatetimeStats {
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub date_range_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BooleanStats {
    pub true_count: usize,
    pub false_count: usize,
    pub true_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextStats {
    pub min_length: usize,
    pub max_length: usize,
    pub avg_length: f64,
    pub median_length: f64,
}

/// Compute statistics for a column under its assigned type.
pub fn statistics(column: &Column, semantic_type: SemanticType) -> ColumnStatistics {
    let count = column.len();
    let null_count = column.null_count();
    let unique_count = column
        .non_null()
        .map(|v| v.to_string())
        .collect::<HashSet<_>>()
        .len();

    let details = match semantic_type {
        SemanticType::Numeric => TypeStatistics::Numeric(numeric_stats(column)),
        SemanticType::Categorical => TypeStatistics::Categorical(categorical_stats(column)),
        SemanticType::Datetime => TypeStatistics::Datetime(datetime_stats(column)),
        SemanticType::Boolean => TypeStatistics::Boolean(boolean_stats(column)),
        SemanticType::Text => TypeStatistics::Text(text_stats(column)),
        SemanticType::Other => TypeStatistics::Other,
    };

    ColumnStatistics {
        count,
        null_count,
        null_percentage: safe_divide(null_count as f64, count as f64) * 100.0,
        unique_count,
        unique_percentage: safe_divide(unique_count as f64, count as f64) * 100.0,
        details,
    }
}

fn numeric_stats(column: &Column) -> NumericStats {
    let mut values: Vec<f64> = column.non_null().filter_map(|v| v.as_f64()).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    if values.is_empty() {
        return NumericStats {
            min: None,
            max: None,
            mean: None,
            median: None,
            std: None,
            p25: None,
            p50: None,
            p75: None,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };

    NumericStats {
        min: values.first().copied(),
        max: values.last().copied(),
        mean: Some(mean),
        median: percentile(&values, 0.5),
        std,
        p25: percentile(&values, 0.25),
        p50: percentile(&values, 0.5),
        p75: percentile(&values, 0.75),
    }
}

/// Linear interpolation between order statistics. Input must be sorted.
fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn categorical_stats(column: &Column) -> CategoricalStats {
    // Tally in first-seen order so ties resolve deterministically.
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in column.non_null() {
        let s = value.to_string();
        if !counts.contains_key(&s) {
            order.push(s.clone());
        }
        *counts.entry(s).or_insert(0) += 1;
    }

    let mut most: Option<(String, usize)> = None;
    let mut least: Option<(String, usize)> = None;
    for s in &order {
        let c = counts[s.as_str()];
        if most.as_ref().map_or(true, |(_, mc)| c > *mc) {
            most = Some((s.clone(), c));
        }
        if least.as_ref().map_or(true, |(_, lc)| c < *lc) {
            least = Some((s.clone(), c));
        }
    }

    CategoricalStats {
        most_common: most.as_ref().map(|(s, _)| s.clone()),
        most_common_count: most.map_or(0, |(_, c)| c),
        least_common: least.as_ref().map(|(s, _)| s.clone()),
        least_common_count: least.map_or(0, |(_, c)| c),
    }
}

fn datetime_stats(column: &Column) -> DatetimeStats {
    let dates: Vec<NaiveDateTime> = column.non_null().filter_map(as_datetime).collect();
    let min_date = dates.iter().min().copied();
    let max_date = dates.iter().max().copied();
    let date_range_days = match (min_date, max_date) {
        (Some(min), Some(max)) => Some(max.signed_duration_since(min).num_days()),
        _ => None,
    };
    DatetimeStats {
        min_date,
        max_date,
        date_range_days,
    }
}

/// Truthy tokens mirror the boolean classifier: native true, numeric 1,
/// or one of the affirmative string tokens.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(v) => *v,
        Value::Int(v) => *v == 1,
        Value::Float(v) => *v == 1.0,
        Value::Str(s) => matches!(s.as_str(), "true" | "yes" | "y" | "1"),
        _ => false,
    }
}

fn boolean_stats(column: &Column) -> BooleanStats {
    let true_count = column.non_null().filter(|v| is_truthy(v)).count();
    let false_count = column.len() - true_count - column.null_count();
    BooleanStats {
        true_count,
        false_count,
        true_percentage: safe_divide(true_count as f64, (true_count + false_count) as f64)
            * 100.0,
    }
}

fn text_stats(column: &Column) -> TextStats {
    let mut lengths: Vec<usize> = column
        .non_null()
        .map(|v| v.to_string().chars().count())
        .collect();
    lengths.sort_unstable();

    if lengths.is_empty() {
        return TextStats {
            min_length: 0,
            max_length: 0,
            avg_length: 0.0,
            median_length: 0.0,
        };
    }

    let as_f64: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();
    TextStats {
        min_length: lengths[0],
        max_length: lengths[lengths.len() - 1],
        avg_length: as_f64.iter().sum::<f64>() / as_f64.len() as f64,
        median_length: percentile(&as_f64, 0.5).unwrap_or(0.0),
    }
}
