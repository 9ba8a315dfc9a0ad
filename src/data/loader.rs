use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::{CellValue, Table};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("no columns to parse from {}", path.display())]
    NoColumns { path: PathBuf },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl From<LoadError> for DashboardError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound { path } => DashboardError::MissingFile { path },
            LoadError::NoColumns { ref path } => DashboardError::Parse {
                path: path.clone(),
                message: "no columns to parse".to_string(),
            },
            LoadError::Csv { path, source } => DashboardError::Parse {
                path,
                message: source.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a delimited file into a [`Table`].
///
/// The first record is the header. Column types are inferred per column:
/// * every non-empty cell parses as `i64`  → integer column
/// * every non-empty cell parses as `f64`  → float column
/// * every non-empty cell is `true`/`false` (any case) → bool column
/// * otherwise                              → text column
///
/// Empty cells become [`CellValue::Null`]. Values are not trimmed or cleaned.
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(csv_err)?;

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::NoColumns {
            path: path.to_path_buf(),
        });
    }

    let columns = dedupe_headers(raw_headers);

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        raw_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|idx| infer_column_kind(raw_rows.iter().map(|row| row[idx].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| kind.convert(cell))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows))
}

/// Make repeated header names unique: `Tc, Tc, Tc` → `Tc, Tc.1, Tc.2`.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        let count = seen.entry(header.clone()).or_insert(0);
        if *count == 0 {
            out.push(header);
        } else {
            out.push(format!("{header}.{count}"));
        }
        *count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn convert(self, cell: String) -> CellValue {
        if cell.is_empty() {
            return CellValue::Null;
        }
        match self {
            ColumnKind::Integer => cell
                .trim()
                .parse()
                .map(CellValue::Integer)
                .unwrap_or(CellValue::String(cell)),
            ColumnKind::Float => cell
                .trim()
                .parse()
                .map(CellValue::Float)
                .unwrap_or(CellValue::String(cell)),
            ColumnKind::Bool => parse_bool(&cell)
                .map(CellValue::Bool)
                .unwrap_or(CellValue::String(cell)),
            ColumnKind::Text => CellValue::String(cell),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn infer_column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut any = false;
    let mut any_empty = false;

    for cell in cells {
        if cell.is_empty() {
            any_empty = true;
            continue;
        }
        any = true;
        let trimmed = cell.trim();
        all_int &= trimmed.parse::<i64>().is_ok();
        all_float &= trimmed.parse::<f64>().is_ok();
        all_bool &= parse_bool(trimmed).is_some();
        if !all_int && !all_float && !all_bool {
            return ColumnKind::Text;
        }
    }

    if !any {
        // All-empty column: keep as float so every cell is Null.
        ColumnKind::Float
    } else if all_int && !any_empty {
        ColumnKind::Integer
    } else if all_float {
        // Integers with gaps widen to float, so `7` reads back as `7.0`.
        ColumnKind::Float
    } else if all_bool {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}
