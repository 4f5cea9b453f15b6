//! Data Processor Module
//! Cleans the raw table and appends the per-student classifications.

use crate::config::ColumnNames;
use crate::error::{CohortError, Result};
use crate::stats::{Grade, Predicate};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Appended letter-grade column.
pub const GRADE_COL: &str = "Grade";
/// Appended graduation-predicate column.
pub const PREDICATE_COL: &str = "Predikat Wisuda";

/// Cell texts treated as missing, matching common spreadsheet exports.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Handles data cleaning and classification.
pub struct DataProcessor;

impl DataProcessor {
    /// Clean a raw table.
    ///
    /// Headers are trimmed, rows missing any required field are dropped, and
    /// GPA and duration are coerced to Float64 with unparseable values set to 0.
    /// Columns outside the schema pass through untouched.
    pub fn clean(df: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
        let df = Self::trim_headers(df)?;

        for name in columns.required() {
            if df.column(name).is_err() {
                return Err(CohortError::MissingColumn(name.to_string()));
            }
        }

        let keep = Self::presence_mask(&df, columns)?;
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            info!("Dropped {} rows with missing required fields", dropped);
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let mut cleaned = df.filter(&mask)?;

        let (gpa, zeroed_gpa) = Self::coerce_numeric(cleaned.column(&columns.gpa)?)?;
        let (duration, zeroed_duration) = Self::coerce_numeric(cleaned.column(&columns.duration)?)?;

        if zeroed_gpa + zeroed_duration > 0 {
            warn!(
                "Non-numeric values set to 0: {} in '{}', {} in '{}'",
                zeroed_gpa, columns.gpa, zeroed_duration, columns.duration
            );
        }

        if let Some(idx) = duration.iter().position(|d| *d < 0.0) {
            let id = cleaned.column(&columns.id)?.get(idx)?;
            return Err(CohortError::invalid(format!(
                "'{}' is negative ({}) for {} {}",
                columns.duration,
                duration[idx],
                columns.id,
                Self::display_value(&id)
            )));
        }

        cleaned.with_column(Column::new(columns.gpa.as_str().into(), gpa))?;
        cleaned.with_column(Column::new(columns.duration.as_str().into(), duration))?;

        Self::warn_duplicate_ids(&cleaned, &columns.id)?;
        debug!("Cleaned table has {} rows", cleaned.height());
        Ok(cleaned)
    }

    /// Append the Grade and Predicate columns to a cleaned table.
    pub fn classify(df: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
        let gpa = df.column(&columns.gpa)?.cast(&DataType::Float64)?;
        let duration = df.column(&columns.duration)?.cast(&DataType::Float64)?;

        let mut grades: Vec<&str> = Vec::with_capacity(df.height());
        let mut predicates: Vec<&str> = Vec::with_capacity(df.height());

        for (g, d) in gpa.f64()?.into_iter().zip(duration.f64()?.into_iter()) {
            let g = g.unwrap_or(0.0);
            let d = d.unwrap_or(0.0);
            grades.push(Grade::from_gpa(g).label());
            predicates.push(Predicate::classify(g, d).label());
        }

        let mut classified = df.clone();
        classified.with_column(Column::new(GRADE_COL.into(), grades))?;
        classified.with_column(Column::new(PREDICATE_COL.into(), predicates))?;
        Ok(classified)
    }

    /// Rebuild the frame with whitespace-trimmed column names.
    fn trim_headers(df: &DataFrame) -> Result<DataFrame> {
        let mut seen = HashSet::new();
        let mut trimmed: Vec<Column> = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().trim();
            if !seen.insert(name.to_string()) {
                return Err(CohortError::invalid(format!(
                    "column '{}' appears more than once after trimming headers",
                    name
                )));
            }
            let series = column.as_materialized_series().clone().with_name(name.into());
            trimmed.push(Column::from(series));
        }

        Ok(DataFrame::new(trimmed)?)
    }

    /// True for every row whose required fields are all present.
    fn presence_mask(df: &DataFrame, columns: &ColumnNames) -> Result<Vec<bool>> {
        let required: Vec<&Column> = columns
            .required()
            .iter()
            .map(|name| df.column(name))
            .collect::<PolarsResult<_>>()?;

        let mut keep = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let mut present = true;
            for column in &required {
                if !Self::is_present(&column.get(row)?) {
                    present = false;
                    break;
                }
            }
            keep.push(present);
        }
        Ok(keep)
    }

    /// Presence check only; a present value may still fail numeric coercion.
    fn is_present(value: &AnyValue) -> bool {
        match value {
            AnyValue::Null => false,
            AnyValue::String(s) => !Self::is_missing_token(s),
            AnyValue::StringOwned(s) => !Self::is_missing_token(s.as_str()),
            AnyValue::Float64(v) => !v.is_nan(),
            AnyValue::Float32(v) => !v.is_nan(),
            _ => true,
        }
    }

    fn is_missing_token(s: &str) -> bool {
        MISSING_TOKENS.contains(&s)
    }

    /// Coerce a column to f64, returning the values and how many became 0.
    fn coerce_numeric(column: &Column) -> Result<(Vec<f64>, usize)> {
        let mut values = Vec::with_capacity(column.len());
        let mut zeroed = 0;

        for row in 0..column.len() {
            match Self::to_number(&column.get(row)?) {
                Some(v) => values.push(v),
                None => {
                    values.push(0.0);
                    zeroed += 1;
                }
            }
        }
        Ok((values, zeroed))
    }

    /// Numeric interpretation of a cell; `None` when it has none.
    pub fn to_number(value: &AnyValue) -> Option<f64> {
        let number = match value {
            AnyValue::Null => None,
            AnyValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            AnyValue::String(s) => s.trim().parse::<f64>().ok(),
            AnyValue::StringOwned(s) => s.as_str().trim().parse::<f64>().ok(),
            other => other.extract::<f64>(),
        };
        number.filter(|v| v.is_finite())
    }

    fn display_value(value: &AnyValue) -> String {
        match value {
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            other => other.to_string(),
        }
    }

    fn warn_duplicate_ids(df: &DataFrame, id_col: &str) -> Result<()> {
        let unique = df.column(id_col)?.as_materialized_series().n_unique()?;
        if unique < df.height() {
            warn!(
                "{} rows share an identifier in '{}'",
                df.height() - unique,
                id_col
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                " NIM ".into(),
                vec![Some("001"), None, Some("003"), Some("004"), Some("005")],
            ),
            Column::new(
                "Nama Mahasiswa".into(),
                vec!["Ani", "Budi", "Citra", "Dodi", "Eka"],
            ),
            Column::new(
                "Program Studi ".into(),
                vec!["Informatika", "Informatika", "Sistem Informasi", "Informatika", "NA"],
            ),
            Column::new(
                "IPK".into(),
                vec![Some("3.80"), Some("3.60"), Some("abc"), Some("3.10"), Some("3.90")],
            ),
            Column::new(
                "Lama Studi (Semester)".into(),
                vec![Some("8"), Some("9"), Some("10"), Some(""), Some("8")],
            ),
            Column::new("Tahun Wisuda".into(), vec![2024i64, 2024, 2024, 2025, 2025]),
            Column::new("Catatan".into(), vec!["x", "y", "z", "w", "v"]),
        ])
        .unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_drops_rows_missing_required_fields() {
        let cleaned = DataProcessor::clean(&raw_frame(), &ColumnNames::default()).unwrap();

        // Budi has no NIM, Dodi has an empty duration, Eka has an "NA" program.
        assert_eq!(cleaned.height(), 2);
        let ids: Vec<Option<&str>> = cleaned
            .column("NIM")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ids, vec![Some("001"), Some("003")]);
    }

    #[test]
    fn test_clean_trims_headers_and_keeps_extra_columns() {
        let cleaned = DataProcessor::clean(&raw_frame(), &ColumnNames::default()).unwrap();
        assert_eq!(
            names(&cleaned),
            vec![
                "NIM",
                "Nama Mahasiswa",
                "Program Studi",
                "IPK",
                "Lama Studi (Semester)",
                "Tahun Wisuda",
                "Catatan"
            ]
        );
    }

    #[test]
    fn test_non_numeric_gpa_is_zeroed_not_dropped() {
        let cleaned = DataProcessor::clean(&raw_frame(), &ColumnNames::default()).unwrap();
        let gpa: Vec<Option<f64>> = cleaned.column("IPK").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(gpa, vec![Some(3.80), Some(0.0)]);

        let classified = DataProcessor::classify(&cleaned, &ColumnNames::default()).unwrap();
        assert_eq!(
            classified.column(GRADE_COL).unwrap().get(1).unwrap(),
            AnyValue::String("D")
        );
        assert_eq!(
            classified.column(PREDICATE_COL).unwrap().get(1).unwrap(),
            AnyValue::String("Cukup")
        );
    }

    #[test]
    fn test_clean_is_idempotent() {
        let columns = ColumnNames::default();
        let once = DataProcessor::clean(&raw_frame(), &columns).unwrap();
        let twice = DataProcessor::clean(&once, &columns).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_missing_column_is_reported_by_name() {
        let df = raw_frame().drop("IPK").unwrap();
        let err = DataProcessor::clean(&df, &ColumnNames::default()).unwrap_err();
        match err {
            CohortError::MissingColumn(name) => assert_eq!(name, "IPK"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_negative_duration_is_invalid() {
        let df = DataFrame::new(vec![
            Column::new("NIM".into(), vec!["001"]),
            Column::new("Nama Mahasiswa".into(), vec!["Ani"]),
            Column::new("Program Studi".into(), vec!["Informatika"]),
            Column::new("IPK".into(), vec![3.5f64]),
            Column::new("Lama Studi (Semester)".into(), vec![-2i64]),
            Column::new("Tahun Wisuda".into(), vec![2024i64]),
        ])
        .unwrap();

        let err = DataProcessor::clean(&df, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, CohortError::InvalidValue(_)));
    }

    #[test]
    fn test_headers_colliding_after_trim_are_invalid() {
        let df = DataFrame::new(vec![
            Column::new("IPK".into(), vec![3.5f64]),
            Column::new(" IPK".into(), vec![3.6f64]),
        ])
        .unwrap();

        let err = DataProcessor::clean(&df, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, CohortError::InvalidValue(_)));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(DataProcessor::to_number(&AnyValue::String(" 3.25 ")), Some(3.25));
        assert_eq!(DataProcessor::to_number(&AnyValue::Int64(8)), Some(8.0));
        assert_eq!(DataProcessor::to_number(&AnyValue::String("abc")), None);
        assert_eq!(DataProcessor::to_number(&AnyValue::String("NaN")), None);
        assert_eq!(DataProcessor::to_number(&AnyValue::Null), None);
    }
}
