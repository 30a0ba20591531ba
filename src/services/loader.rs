use crate::error::AppError;
use crate::services::table::{Column, Table, Value};
use calamine::{open_workbook_auto, Data, Reader};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Load a table from a file, dispatching on the extension. Unsupported
/// extensions and malformed content are descriptive errors; the shape of
/// the data itself (types, nulls) is never validated here.
pub fn load(path: &Path) -> Result<Table, AppError> {
    let start = std::time::Instant::now();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" | "tsv" => load_delimited(path, false),
        "txt" => load_delimited(path, true),
        "xlsx" | "xls" => load_excel(path),
        "json" => load_json(path),
        "db" => load_sqlite(path),
        _ => Err(AppError::InvalidInput(format!(
            "Unsupported file extension: '{}'",
            path.display()
        ))),
    }?;

    info!(
        "Loaded {} ({} rows x {} columns) in {:?}",
        path.display(),
        table.row_count(),
        table.column_count(),
        start.elapsed()
    );
    Ok(table)
}

/// Keep header text as given, but name blank headers and uniquify
/// duplicates with a numeric suffix.
fn unique_column_name(raw: &str, index: usize, existing: &mut HashSet<String>) -> String {
    let base = raw.trim();
    let mut name = if base.is_empty() {
        format!("col_{}", index)
    } else {
        base.to_string()
    };

    let original = name.clone();
    let mut counter = 1;
    while !existing.insert(name.clone()) {
        name = format!("{}_{}", original, counter);
        counter += 1;
    }
    name
}

/// Pick a delimiter by inspecting the first line: tab beats semicolon
/// beats comma; text files additionally fall back to spaces.
fn sniff_delimiter(path: &Path, allow_space: bool) -> Result<u8, AppError> {
    let file = File::open(path)?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;

    let delimiter = if first_line.contains('\t') {
        b'\t'
    } else if first_line.contains(';') {
        b';'
    } else if first_line.contains(',') || !allow_space {
        b','
    } else {
        b' '
    };
    Ok(delimiter)
}

fn load_delimited(path: &Path, allow_space: bool) -> Result<Table, AppError> {
    let delimiter = sniff_delimiter(path, allow_space)?;
    debug!(
        "Reading {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let mut existing = HashSet::new();
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| unique_column_name(h, idx, &mut existing))
        .collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (idx, column) in cells.iter_mut().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            column.push(if raw.is_empty() {
                Value::Null
            } else {
                Value::Str(raw.to_string())
            });
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, coerce_numeric_column(values)))
        .collect();
    Table::new(columns)
}

/// Whole-column numeric coercion, as a CSV reader without dtypes would do:
/// if every non-null cell parses as an integer the column becomes Int, if
/// every one parses as a float it becomes Float, otherwise the strings
/// stay untouched.
fn coerce_numeric_column(values: Vec<Value>) -> Vec<Value> {
    if !values.iter().any(|v| matches!(v, Value::Str(_))) {
        return values;
    }

    let as_ints: Option<Vec<Value>> = values
        .iter()
        .map(|v| match v {
            Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            other => Some(other.clone()),
        })
        .collect();
    if let Some(ints) = as_ints {
        return ints;
    }

    let as_floats: Option<Vec<Value>> = values
        .iter()
        .map(|v| match v {
            Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            other => Some(other.clone()),
        })
        .collect();
    as_floats.unwrap_or(values)
}

fn load_excel(path: &Path) -> Result<Table, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::FileProcessing(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::FileProcessing("No sheets found in workbook".to_string()))?;
    debug!("Reading sheet '{}' from {}", sheet_name, path.display());

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::FileProcessing(format!("Failed to read worksheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = match rows.next() {
        Some(row) => row,
        None => return Table::new(vec![]),
    };

    let mut existing = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| unique_column_name(&cell.to_string(), idx, &mut existing))
        .collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(idx).map_or(Value::Null, excel_value));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

fn excel_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(v) => Value::Int(*v),
        Data::Float(v) => Value::Float(*v),
        Data::Bool(v) => Value::Bool(*v),
        Data::String(s) => {
            if s.is_empty() {
                Value::Null
            } else {
                Value::Str(s.clone())
            }
        }
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Value::DateTime(naive),
            None => Value::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Str(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

fn load_json(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path)?;
    let parsed: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;

    let records: Vec<serde_json::Map<String, serde_json::Value>> = match parsed {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(map) => Ok(map),
                other => Err(AppError::FileProcessing(format!(
                    "Expected an array of objects, found {}",
                    json_kind(&other)
                ))),
            })
            .collect::<Result<_, _>>()?,
        serde_json::Value::Object(map) => {
            // A lone object is one row; nested objects flatten into
            // dot-separated column names.
            let mut flat = serde_json::Map::new();
            flatten_json_object(None, &map, &mut flat);
            vec![flat]
        }
        other => {
            return Err(AppError::FileProcessing(format!(
                "Unsupported JSON structure: {}",
                json_kind(&other)
            )))
        }
    };

    // Column order is first-appearance order across all records.
    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|record| record.get(&name).map_or(Value::Null, json_value))
                .collect();
            Column::new(name, values)
        })
        .collect();
    Table::new(columns)
}

fn flatten_json_object(
    prefix: Option<&str>,
    map: &serde_json::Map<String, serde_json::Value>,
    out: &mut serde_json::Map<String, serde_json::Value>,
) {
    for (key, value) in map {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            serde_json::Value::Object(nested) => flatten_json_object(Some(&name), nested, out),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a nested array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn json_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(v) => Value::Bool(*v),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}

fn load_sqlite(path: &Path) -> Result<Table, AppError> {
    let conn = Connection::open(path)?;

    let table_name: String = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY rowid LIMIT 1",
            [],
            |row| row.get(0),
        )
        .map_err(|_| {
            AppError::FileProcessing("No tables found in the SQLite database".to_string())
        })?;
    debug!("Reading table '{}' from {}", table_name, path.display());

    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", table_name))?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); column_names.len()];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (idx, column) in cells.iter_mut().enumerate() {
            let value = match row.get_ref(idx)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(bytes) => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
                ValueRef::Blob(bytes) => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
            };
            column.push(value);
        }
    }

    let columns = column_names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("chart_suggester_tests");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{}_{}", std::process::id(), name))
    }

    fn write_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = temp_path(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn unsupported_extension_is_invalid_input() {
        let err = load(Path::new("data.parquet")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn loads_comma_csv_with_numeric_coercion() {
        let path = write_file("basic.csv", "name,age,score\nann,34,1.5\nbob,28,2.25\ncid,,3\n");
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["name", "age", "score"]);
        assert_eq!(table.row_count(), 3);

        let age = table.column("age").unwrap();
        assert_eq!(age.values()[0], Value::Int(34));
        assert_eq!(age.values()[2], Value::Null);

        let score = table.column("score").unwrap();
        assert_eq!(score.values()[1], Value::Float(2.25));
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        let path = write_file("semi.csv", "a;b\n1;x\n2;y\n");
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.column("a").unwrap().values()[1], Value::Int(2));
    }

    #[test]
    fn loads_tab_separated_tsv() {
        let path = write_file("tabs.tsv", "a\tb\n1\tx\n2\ty\n");
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.column("a").unwrap().values()[1], Value::Int(2));
        assert_eq!(
            table.column("b").unwrap().values()[0],
            Value::Str("x".into())
        );
    }

    #[test]
    fn space_delimited_txt() {
        let path = write_file("plain.txt", "a b\n1 x\n2 y\n");
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(
            table.column("b").unwrap().values()[0],
            Value::Str("x".into())
        );
    }

    #[test]
    fn uniquifies_duplicate_and_blank_headers() {
        let path = write_file("dupes.csv", "a,a,\n1,2,3\n");
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["a", "a_1", "col_2"]);
    }

    #[test]
    fn loads_json_array_of_objects() {
        let path = write_file(
            "rows.json",
            r#"[{"city": "Leeds", "pop": 500000}, {"city": "York"}, {"pop": 150000, "area": 2.5}]"#,
        );
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["city", "pop", "area"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("pop").unwrap().values()[1], Value::Null);
        assert_eq!(table.column("area").unwrap().values()[2], Value::Float(2.5));
    }

    #[test]
    fn single_json_object_flattens_to_dotted_columns() {
        let path = write_file(
            "nested.json",
            r#"{"name": "ann", "address": {"city": "Leeds", "geo": {"lat": 53.8}}}"#,
        );
        let table = load(&path).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.column_names(),
            vec!["address.city", "address.geo.lat", "name"]
        );
        assert_eq!(
            table.column("address.geo.lat").unwrap().values()[0],
            Value::Float(53.8)
        );
    }

    #[test]
    fn rejects_scalar_json() {
        let path = write_file("scalar.json", "42");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, AppError::FileProcessing(_)));
    }

    #[test]
    fn loads_first_sqlite_table() {
        let path = temp_path("fixture.db");
        let _ = std::fs::remove_file(&path);
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE readings (city TEXT, temp REAL, n INTEGER);
                 INSERT INTO readings VALUES ('Leeds', 11.5, 3), ('York', NULL, 4);",
            )
            .unwrap();
        }
        let table = load(&path).unwrap();
        assert_eq!(table.column_names(), vec!["city", "temp", "n"]);
        assert_eq!(table.column("temp").unwrap().values()[1], Value::Null);
        assert_eq!(table.column("n").unwrap().values()[0], Value::Int(3));
    }
}
