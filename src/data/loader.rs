//! Data Loader Module
//! Reads the cohort snapshot into a raw Polars DataFrame.
//!
//! Spreadsheets go through calamine (first worksheet only), CSV files through
//! the Polars CSV reader. Headers are kept verbatim; trimming belongs to the
//! cleaning stage.

use crate::error::{CohortError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

static EMPTY_CELL: Data = Data::Empty;

/// Supported source formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Spreadsheet),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// Loads the raw source table.
pub struct DataLoader;

impl DataLoader {
    /// Load the source table at `path`.
    ///
    /// Fails with `SourceNotFound` when the path does not exist and
    /// `SourceUnreadable` when it cannot be parsed.
    pub fn load(path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(CohortError::SourceNotFound(path.to_path_buf()));
        }

        let format = SourceFormat::from_path(path).ok_or_else(|| CohortError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: "unsupported file extension".to_string(),
        })?;

        let df = match format {
            SourceFormat::Spreadsheet => Self::load_spreadsheet(path)?,
            SourceFormat::Csv => Self::load_csv(path)?,
        };

        info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Read a CSV file with every column as text; numeric coercion happens later.
    fn load_csv(path: &Path) -> Result<DataFrame> {
        let unreadable = |e: PolarsError| CohortError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(unreadable)
    }

    fn load_spreadsheet(path: &Path) -> Result<DataFrame> {
        let unreadable = |reason: String| CohortError::SourceUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| unreadable("workbook has no worksheets".to_string()))?
            .map_err(|e| unreadable(e.to_string()))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            debug!("First worksheet is empty");
            return Ok(DataFrame::empty());
        };

        let headers = Self::unique_headers(header_row);
        let body: Vec<&[Data]> = rows.collect();

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
                    .collect();
                Self::build_column(name, &cells)
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Header texts with blanks named `Unnamed: N` and repeats suffixed `.1`, `.2`, ...
    fn unique_headers(row: &[Data]) -> Vec<String> {
        let raw: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let text = Self::cell_to_string(cell);
                if text.trim().is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    text
                }
            })
            .collect();

        // Suffixes must not collide with headers that appear later either.
        let mut taken: HashSet<String> = raw.iter().cloned().collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut next_suffix: HashMap<&str, usize> = HashMap::new();

        raw.iter()
            .map(|base| {
                if seen.insert(base.as_str()) {
                    return base.clone();
                }
                let suffix = next_suffix.entry(base.as_str()).or_insert(1);
                loop {
                    let candidate = format!("{}.{}", base, suffix);
                    *suffix += 1;
                    if taken.insert(candidate.clone()) {
                        return candidate;
                    }
                }
            })
            .collect()
    }

    /// Build one column, typed the way a spreadsheet user would expect:
    /// all-integer cells become Int64, all-numeric cells Float64, anything
    /// else text. Empty and error cells are null.
    fn build_column(name: &str, cells: &[&Data]) -> Column {
        let has_values = cells.iter().any(|c| !Self::is_empty_cell(c));
        let all_numeric = cells
            .iter()
            .all(|c| Self::is_empty_cell(c) || Self::numeric_value(c).is_some());

        if has_values && all_numeric {
            let values: Vec<Option<f64>> = cells.iter().map(|c| Self::numeric_value(c)).collect();
            let integral = values
                .iter()
                .flatten()
                .all(|v| v.fract() == 0.0 && v.abs() < 1e15);

            if integral {
                let ints: Vec<Option<i64>> =
                    values.iter().map(|v| v.map(|v| v as i64)).collect();
                return Column::new(name.into(), ints);
            }
            return Column::new(name.into(), values);
        }

        let texts: Vec<Option<String>> = cells
            .iter()
            .map(|c| {
                if Self::is_empty_cell(c) {
                    None
                } else {
                    Some(Self::cell_to_string(c))
                }
            })
            .collect();
        Column::new(name.into(), texts)
    }

    fn is_empty_cell(cell: &Data) -> bool {
        matches!(cell, Data::Empty | Data::Error(_))
    }

    fn numeric_value(cell: &Data) -> Option<f64> {
        match cell {
            Data::Float(f) => Some(*f),
            Data::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert a cell to its text representation
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(d) => Self::excel_serial_to_date_string(d.as_f64()),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            Data::Error(e) => format!("#{:?}", e),
        }
    }

    /// Convert an Excel serial date to an ISO date string.
    fn excel_serial_to_date_string(serial: f64) -> String {
        // Excel epoch is 1899-12-30 (with the 1900 leap year bug)
        let days = serial as i64;
        chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|base| base.checked_add_signed(chrono::Duration::days(days)))
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| serial.to_string())
    }
}
