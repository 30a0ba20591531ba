use crate::error::AppError;
use crate::services::profile::classify;
use crate::services::table::{SemanticType, Table};
use std::collections::HashSet;

/// Column names of a table (or selection) partitioned by semantic type.
/// `other` columns take no part in rule matching.
#[derive(Debug, Default)]
struct TypeBuckets {
    numeric: Vec<String>,
    categorical: Vec<String>,
    datetime: Vec<String>,
    boolean: Vec<String>,
    text: Vec<String>,
}

impl TypeBuckets {
    fn from_table(table: &Table) -> Self {
        let mut buckets = TypeBuckets::default();
        for column in table.columns() {
            let name = column.name().to_string();
            match classify(column) {
                SemanticType::Numeric => buckets.numeric.push(name),
                SemanticType::Categorical => buckets.categorical.push(name),
                SemanticType::Datetime => buckets.datetime.push(name),
                SemanticType::Boolean => buckets.boolean.push(name),
                SemanticType::Text => buckets.text.push(name),
                SemanticType::Other => {}
            }
        }
        buckets
    }
}

type Predicate = fn(&TypeBuckets) -> bool;
type Builder = fn(&TypeBuckets) -> Vec<&'static str>;

/// Whole-table rules, evaluated top to bottom; the first matching predicate
/// supplies the suggestion set and no later rule is consulted. The order is
/// the contract, not an optimization.
const WHOLE_TABLE_RULES: &[(Predicate, Builder)] = &[
    // Single numeric column
    (
        |b| b.numeric.len() == 1 && b.categorical.is_empty() && b.datetime.is_empty(),
        |_| vec!["Histogram", "Box Plot", "Density Plot", "Violin Plot"],
    ),
    // Single categorical column
    (
        |b| b.categorical.len() == 1 && b.numeric.is_empty() && b.datetime.is_empty(),
        |_| vec!["Bar Chart", "Pie Chart", "Count Plot"],
    ),
    // Single boolean column
    (
        |b| {
            b.boolean.len() == 1
                && b.numeric.is_empty()
                && b.categorical.is_empty()
                && b.datetime.is_empty()
        },
        |_| vec!["Bar Chart", "Pie Chart"],
    ),
    // Single datetime column
    (
        |b| b.datetime.len() == 1 && b.numeric.is_empty() && b.categorical.is_empty(),
        |_| vec!["Time Series Plot", "Histogram"],
    ),
    // Two or more numeric columns
    (
        |b| b.numeric.len() >= 2 && b.categorical.is_empty() && b.datetime.is_empty(),
        |b| {
            let mut s = vec!["Scatter Plot", "Line Chart", "Hexbin Plot", "Joint Plot"];
            if b.numeric.len() >= 3 {
                s.push("Bubble Chart");
            }
            s
        },
    ),
    // Categorical with numeric
    (
        |b| !b.categorical.is_empty() && !b.numeric.is_empty() && b.datetime.is_empty(),
        |b| {
            let mut s = vec![
                "Bar Chart",
                "Box Plot",
                "Violin Plot",
                "Swarm Plot",
                "Strip Plot",
            ];
            if b.categorical.len() == 1 && b.numeric.len() == 1 {
                s.push("Pie Chart");
            }
            s
        },
    ),
    // Datetime with numeric
    (
        |b| !b.datetime.is_empty() && !b.numeric.is_empty(),
        |_| vec!["Line Chart", "Area Chart", "Time Series Plot"],
    ),
    // Boolean with numeric
    (
        |b| !b.boolean.is_empty() && !b.numeric.is_empty(),
        |_| vec!["Box Plot", "Violin Plot", "Bar Chart"],
    ),
    // Categorical with boolean
    (
        |b| !b.categorical.is_empty() && !b.boolean.is_empty(),
        |_| vec!["Bar Chart", "Heatmap", "Stacked Bar Chart"],
    ),
    // Datetime with categorical
    (
        |b| !b.datetime.is_empty() && !b.categorical.is_empty(),
        |_| vec!["Line Chart", "Bar Chart over Time"],
    ),
    // Several numeric with a categorical hue
    (
        |b| b.numeric.len() >= 2 && !b.categorical.is_empty(),
        |_| {
            vec![
                "Scatter Plot (with hue)",
                "Line Chart (with hue)",
                "Pair Plot",
                "Facet Grid",
            ]
        },
    ),
    // Text columns
    (
        |b| !b.text.is_empty(),
        |b| {
            if b.text.len() == 1 {
                vec!["Word Cloud", "Text Length Histogram"]
            } else {
                vec!["Word Cloud Comparison", "Text Length Comparison"]
            }
        },
    ),
    // Datetime only
    (
        |b| !b.datetime.is_empty() && b.numeric.is_empty(),
        |_| vec!["Time Series Plot", "Event Timeline"],
    ),
];

fn dedup_preserving(suggestions: Vec<&'static str>) -> Vec<&'static str> {
    let mut seen = HashSet::new();
    suggestions.into_iter().filter(|s| seen.insert(*s)).collect()
}

/// Suggest chart types for the table as a whole.
pub fn suggest_for_table(table: &Table) -> Vec<&'static str> {
    let buckets = TypeBuckets::from_table(table);
    let base = WHOLE_TABLE_RULES
        .iter()
        .find(|(applies, _)| applies(&buckets))
        .map(|(_, build)| build(&buckets))
        .unwrap_or_else(|| vec!["Table View"]);
    dedup_preserving(base)
}

fn suggestions_for_single(semantic_type: SemanticType) -> Vec<&'static str> {
    match semantic_type {
        SemanticType::Numeric => vec!["Histogram", "Box Plot", "Density Plot", "Violin Plot"],
        SemanticType::Categorical => vec!["Bar Chart", "Pie Chart", "Count Plot"],
        SemanticType::Datetime => vec!["Time Series Plot", "Histogram"],
        SemanticType::Boolean => vec!["Bar Chart", "Pie Chart"],
        SemanticType::Text => vec!["Word Cloud", "Text Length Histogram"],
        SemanticType::Other => vec!["Table View"],
    }
}

/// Pair dispatch is order-symmetric: (categorical, numeric) and
/// (numeric, categorical) land on the same suggestions.
fn suggestions_for_pair(x: SemanticType, y: SemanticType) -> Vec<&'static str> {
    use SemanticType::*;
    match (x, y) {
        (Numeric, Numeric) => vec!["Scatter Plot", "Line Chart", "Hexbin Plot", "Joint Plot"],
        (Categorical, Numeric) | (Numeric, Categorical) => vec![
            "Bar Chart",
            "Box Plot",
            "Violin Plot",
            "Swarm Plot",
            "Strip Plot",
        ],
        (Categorical, Categorical) => vec!["Bar Chart", "Heatmap", "Stacked Bar Chart"],
        (Datetime, Numeric) | (Numeric, Datetime) => {
            vec!["Line Chart", "Area Chart", "Time Series Plot"]
        }
        (Datetime, Categorical) | (Categorical, Datetime) => {
            vec!["Line Chart", "Bar Chart over Time"]
        }
        (Boolean, Numeric) | (Numeric, Boolean) => vec!["Box Plot", "Violin Plot", "Bar Chart"],
        (Boolean, Categorical) | (Categorical, Boolean) => {
            vec!["Bar Chart", "Heatmap", "Stacked Bar Chart"]
        }
        (Text, Numeric) | (Numeric, Text) => vec!["Bar Chart", "Scatter Plot"],
        (Text, Categorical) | (Categorical, Text) => vec!["Bar Chart", "Heatmap"],
        _ => vec!["Table View"],
    }
}

/// Priority chain over bucket counts within a 3+ column selection. The
/// boolean-only branch deliberately yields nothing when neither numeric nor
/// categorical columns accompany it.
fn suggestions_for_many(buckets: &TypeBuckets) -> Vec<&'static str> {
    let mut suggestions = Vec::new();
    if buckets.numeric.len() >= 2 {
        suggestions.extend(["Scatter Plot", "Line Chart"]);
        if !buckets.categorical.is_empty() {
            suggestions.extend(["Scatter Plot (with hue)", "Line Chart (with hue)"]);
        }
        if buckets.numeric.len() >= 3 {
            suggestions.push("Bubble Chart");
        }
    } else if !buckets.categorical.is_empty() && !buckets.numeric.is_empty() {
        suggestions.extend(["Bar Chart", "Box Plot", "Violin Plot", "Swarm Plot"]);
    } else if !buckets.datetime.is_empty() {
        if !buckets.numeric.is_empty() {
            suggestions.extend(["Line Chart", "Area Chart"]);
        } else if !buckets.categorical.is_empty() {
            suggestions.extend(["Line Chart", "Bar Chart over Time"]);
        } else {
            suggestions.push("Time Series Plot");
        }
    } else if !buckets.boolean.is_empty() {
        if !buckets.numeric.is_empty() {
            suggestions.extend(["Box Plot", "Violin Plot", "Bar Chart"]);
        } else if !buckets.categorical.is_empty() {
            suggestions.extend(["Bar Chart", "Heatmap", "Stacked Bar Chart"]);
        }
    } else if !buckets.text.is_empty() {
        if buckets.text.len() == 1 {
            suggestions.extend(["Word Cloud", "Text Length Histogram"]);
        } else {
            suggestions.extend(["Word Cloud Comparison", "Text Length Comparison"]);
        }
    } else {
        suggestions.push("Table View");
    }
    suggestions
}

/// Suggest chart types for an explicit column selection. The selection must
/// be non-empty and every name must exist in the table; both are caller
/// contract violations, surfaced as invalid input rather than a silent
/// Table View.
pub fn suggest_for_columns(
    table: &Table,
    selected: &[String],
) -> Result<Vec<&'static str>, AppError> {
    let subset = table.select(selected)?;

    let suggestions = match subset.column_count() {
        1 => suggestions_for_single(classify(&subset.columns()[0])),
        2 => suggestions_for_pair(
            classify(&subset.columns()[0]),
            classify(&subset.columns()[1]),
        ),
        _ => suggestions_for_many(&TypeBuckets::from_table(&subset)),
    };

    Ok(dedup_preserving(suggestions))
}
