//! Statistics Calculator Module
//! Cohort aggregates: program headcounts, program mean GPA, predicate
//! distribution and the highest-GPA subset.

use crate::config::ColumnNames;
use crate::data::{GRADE_COL, PREDICATE_COL};
use crate::error::Result;
use polars::prelude::*;

/// Headcount column of the per-program table.
pub const COUNT_COL: &str = "Jumlah Wisudawan";
/// Frequency column of the predicate distribution.
pub const FREQUENCY_COL: &str = "count";

/// Computes per-program aggregates over a classified table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Number of students per program, ordered by program name.
    pub fn program_counts(df: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
        let program = columns.program.as_str();
        let counts = df
            .clone()
            .lazy()
            .group_by([col(program)])
            .agg([col(columns.id.as_str()).count().alias(COUNT_COL)])
            .sort([program], SortMultipleOptions::default())
            .collect()?;
        Ok(counts)
    }

    /// Arithmetic mean GPA per program, ordered by program name. Not rounded.
    pub fn program_mean_gpa(df: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
        let program = columns.program.as_str();
        let means = df
            .clone()
            .lazy()
            .group_by([col(program)])
            .agg([col(columns.gpa.as_str()).mean()])
            .sort([program], SortMultipleOptions::default())
            .collect()?;
        Ok(means)
    }

    /// Students per predicate, most frequent first; ties keep first-seen order.
    pub fn predicate_distribution(df: &DataFrame) -> Result<DataFrame> {
        let distribution = df
            .clone()
            .lazy()
            .group_by_stable([col(PREDICATE_COL)])
            .agg([col(PREDICATE_COL).count().alias(FREQUENCY_COL)])
            .sort(
                [FREQUENCY_COL],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?;
        Ok(distribution)
    }

    /// The `n` highest-GPA students, descending, stable on ties, display columns only.
    pub fn top_by_gpa(df: &DataFrame, columns: &ColumnNames, n: usize) -> Result<DataFrame> {
        let sorted = df.sort(
            [columns.gpa.as_str()],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )?;

        let top = sorted.head(Some(n)).select([
            columns.id.as_str(),
            columns.name.as_str(),
            columns.program.as_str(),
            columns.gpa.as_str(),
            GRADE_COL,
            PREDICATE_COL,
        ])?;
        Ok(top)
    }

    /// (label, value) pairs from two columns of an aggregate table, in row order.
    pub fn labelled_values(
        df: &DataFrame,
        label_col: &str,
        value_col: &str,
    ) -> Result<Vec<(String, f64)>> {
        let labels = df.column(label_col)?.cast(&DataType::String)?;
        let values = df.column(value_col)?.cast(&DataType::Float64)?;

        let pairs = labels
            .as_materialized_series()
            .str()?
            .into_iter()
            .zip(values.f64()?.into_iter())
            .map(|(label, value)| {
                (
                    label.unwrap_or_default().to_string(),
                    value.unwrap_or(f64::NAN),
                )
            })
            .collect();
        Ok(pairs)
    }
}
