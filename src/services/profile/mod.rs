pub mod classify;
pub mod stats;

pub use classify::classify;
pub use stats::{ColumnStatistics, TypeStatistics};

use crate::services::table::{Column, SemanticType, Table};
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;

pub const SAMPLE_SIZE: usize = 3;
/// How many leading rows go into the profile's data preview.
pub const SAMPLE_ROWS: usize = 5;

/// Profile of one column: its assigned type, statistics under that type,
/// and a short value preview.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub semantic_type: SemanticType,
    pub statistics: ColumnStatistics,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
}

/// How many columns landed in each semantic type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub numeric: usize,
    pub categorical: usize,
    pub datetime: usize,
    pub boolean: usize,
    pub text: usize,
    pub other: usize,
}

impl TypeCounts {
    fn record(&mut self, semantic_type: SemanticType) {
        match semantic_type {
            SemanticType::Numeric => self.numeric += 1,
            SemanticType::Categorical => self.categorical += 1,
            SemanticType::Datetime => self.datetime += 1,
            SemanticType::Boolean => self.boolean += 1,
            SemanticType::Text => self.text += 1,
            SemanticType::Other => self.other += 1,
        }
    }
}

/// Derived profile of a whole table. Recomputed on demand, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub type_counts: TypeCounts,
    pub sample_data: Vec<Vec<String>>,
}

fn profile_column(column: &Column) -> ColumnProfile {
    let semantic_type = classify(column);
    let statistics = stats::statistics(column, semantic_type);
    let sample_values = column
        .values()
        .iter()
        .take(SAMPLE_SIZE)
        .map(|v| v.to_string())
        .collect();
    ColumnProfile {
        name: column.name().to_string(),
        semantic_type,
        statistics,
        sample_values,
    }
}

/// Classify and summarize every column of the table. Columns are
/// independent read-only work, so they are profiled as a parallel map;
/// `collect` keeps table order.
pub fn analyze(table: &Table) -> DatasetProfile {
    let start = std::time::Instant::now();

    let columns: Vec<ColumnProfile> = table.columns().par_iter().map(profile_column).collect();

    let mut type_counts = TypeCounts::default();
    for profile in &columns {
        type_counts.record(profile.semantic_type);
    }

    tracing::debug!(
        "Profiled {} columns x {} rows in {:?}",
        table.column_count(),
        table.row_count(),
        start.elapsed()
    );

    DatasetProfile {
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns,
        type_counts,
        sample_data: table.sample_rows(SAMPLE_ROWS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::table::Value;

    fn mixed_table() -> Table {
        Table::new(vec![
            Column::new(
                "amount",
                (0..30).map(|i| Value::Float(i as f64 * 1.1)).collect(),
            ),
            Column::new(
                "city",
                (0..30)
                    .map(|i| Value::Str(["Leeds", "York"][i % 2].to_string()))
                    .collect(),
            ),
            Column::new(
                "active",
                (0..30).map(|i| Value::Bool(i % 3 == 0)).collect(),
            ),
            Column::new("blank", (0..30).map(|_| Value::Null).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn profiles_every_column_in_order() {
        let profile = analyze(&mixed_table());
        assert_eq!(profile.row_count, 30);
        assert_eq!(profile.column_count, 4);
        let names: Vec<&str> = profile.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["amount", "city", "active", "blank"]);
    }

    #[test]
    fn counts_columns_per_type() {
        let profile = analyze(&mixed_table());
        assert_eq!(
            profile.type_counts,
            TypeCounts {
                numeric: 1,
                categorical: 1,
                boolean: 1,
                other: 1,
                ..TypeCounts::default()
            }
        );
    }

    #[test]
    fn empty_table_profile() {
        let profile = analyze(&Table::new(vec![]).unwrap());
        assert_eq!(profile.row_count, 0);
        assert_eq!(profile.column_count, 0);
        assert!(profile.columns.is_empty());
        assert_eq!(profile.type_counts, TypeCounts::default());
    }

    #[test]
    fn sample_values_are_capped() {
        let profile = analyze(&mixed_table());
        for col in &profile.columns {
            assert!(col.sample_values.len() <= SAMPLE_SIZE);
        }
        assert_eq!(profile.sample_data.len(), SAMPLE_ROWS);
        assert_eq!(profile.sample_data[0].len(), 4);
    }
}
