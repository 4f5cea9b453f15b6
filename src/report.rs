//! Report Module
//! Runs the cohort pipeline and packages its tables for the collaborators
//! (console summary, workbook, charts).

use crate::config::ColumnNames;
use crate::data::{DataLoader, DataProcessor};
use crate::error::Result;
use crate::stats::StatsCalculator;
use crate::xlsx::XlsxWriter;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

pub const STUDENTS_SHEET: &str = "Data Wisudawan Lengkap";
pub const COUNTS_SHEET: &str = "Jumlah per Prodi";
pub const MEAN_GPA_SHEET: &str = "Rata IPK per Prodi";

/// Output of one pipeline run. Collaborators read it, never modify it.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    /// Cleaned table with Grade and Predicate appended.
    pub students: DataFrame,
    /// Program → headcount.
    pub program_counts: DataFrame,
    /// Program → mean GPA.
    pub program_mean_gpa: DataFrame,
    /// Highest-GPA students, display columns only.
    pub top_students: DataFrame,
    /// Predicate → number of students.
    pub predicate_distribution: DataFrame,
    /// Schema the tables were built with.
    pub columns: ColumnNames,
    pub top_n: usize,
}

impl ReportBundle {
    /// Load `source` and run every stage: clean, classify, aggregate, select.
    pub fn process(source: &Path, columns: &ColumnNames, top_n: usize) -> Result<Self> {
        let raw = DataLoader::load(source)?;
        Self::assemble(&raw, columns, top_n)
    }

    /// Build the bundle from an already loaded raw table.
    pub fn assemble(raw: &DataFrame, columns: &ColumnNames, top_n: usize) -> Result<Self> {
        let cleaned = DataProcessor::clean(raw, columns)?;
        let students = DataProcessor::classify(&cleaned, columns)?;

        let program_counts = StatsCalculator::program_counts(&students, columns)?;
        let program_mean_gpa = StatsCalculator::program_mean_gpa(&students, columns)?;
        let predicate_distribution = StatsCalculator::predicate_distribution(&students)?;
        let top_students = StatsCalculator::top_by_gpa(&students, columns, top_n)?;

        info!(
            "Classified {} students across {} programs",
            students.height(),
            program_counts.height()
        );

        Ok(Self {
            students,
            program_counts,
            program_mean_gpa,
            top_students,
            predicate_distribution,
            columns: columns.clone(),
            top_n,
        })
    }

    pub fn top_sheet_name(&self) -> String {
        format!("Top {} IPK Tertinggi", self.top_n)
    }

    /// The four workbook sheets, in output order.
    pub fn sheets(&self) -> Vec<(String, &DataFrame)> {
        vec![
            (STUDENTS_SHEET.to_string(), &self.students),
            (COUNTS_SHEET.to_string(), &self.program_counts),
            (MEAN_GPA_SHEET.to_string(), &self.program_mean_gpa),
            (self.top_sheet_name(), &self.top_students),
        ]
    }

    /// Write the four tables to one workbook, overwriting `output`.
    pub fn write_workbook(&self, output: &Path) -> Result<()> {
        XlsxWriter::write_sheets(&self.sheets(), output)
    }

    /// Print the console summary.
    pub fn print_summary(&self, preview_rows: usize) {
        Self::print_section("🎓 DATA WISUDAWAN TERIMPORT");
        println!("{}", self.students.head(Some(preview_rows)));

        Self::print_section("📊 JUMLAH WISUDAWAN PER PRODI");
        println!("{}", self.program_counts);

        Self::print_section("🏅 DISTRIBUSI PREDIKAT WISUDA");
        println!("{}", self.predicate_distribution);

        Self::print_section(&format!(
            "🌟 {} MAHASISWA DENGAN IPK TERTINGGI",
            self.top_n
        ));
        println!("{}", self.top_students);
    }

    fn print_section(title: &str) {
        println!("\n===============================");
        println!("{}", title);
        println!("===============================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CohortError;
    use crate::stats::COUNT_COL;
    use calamine::{open_workbook, Reader, Xlsx};
    use std::fs;

    const CSV: &str = "\
NIM,Nama Mahasiswa,Program Studi,IPK,Lama Studi (Semester),Tahun Wisuda
001,Ani,Informatika,3.85,8,2024
,Tanpa NIM,Informatika,3.99,8,2024
003,Citra,Sistem Informasi,abc,9,2024
004,Dodi,Akuntansi,3.60,9,2024
005,Eka,Informatika,3.10,10,2024
";

    fn ids(df: &DataFrame, column: &str) -> Vec<String> {
        df.column(column)
            .unwrap()
            .cast(&DataType::String)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    fn bundle_from_csv() -> ReportBundle {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wisuda.csv");
        fs::write(&path, CSV).unwrap();
        ReportBundle::process(&path, &ColumnNames::default(), 5).unwrap()
    }

    #[test]
    fn test_row_without_identifier_is_absent_everywhere() {
        let bundle = bundle_from_csv();

        assert_eq!(bundle.students.height(), 4);
        assert!(!ids(&bundle.students, "Nama Mahasiswa").contains(&"Tanpa NIM".to_string()));
        assert!(!ids(&bundle.top_students, "Nama Mahasiswa").contains(&"Tanpa NIM".to_string()));

        // The 3.99 GPA would have pulled Informatika's mean above 3.5.
        let means =
            StatsCalculator::labelled_values(&bundle.program_mean_gpa, "Program Studi", "IPK")
                .unwrap();
        let informatika = means.iter().find(|(p, _)| p == "Informatika").unwrap();
        assert!((informatika.1 - (3.85 + 3.10) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_headcounts_cover_every_student() {
        let bundle = bundle_from_csv();
        let counts = StatsCalculator::labelled_values(
            &bundle.program_counts,
            "Program Studi",
            COUNT_COL,
        )
        .unwrap();
        let total: f64 = counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total as usize, bundle.students.height());
    }

    #[test]
    fn test_non_numeric_gpa_student_is_kept_as_zero() {
        let bundle = bundle_from_csv();
        let top = ids(&bundle.top_students, "NIM");
        assert_eq!(top, vec!["001", "004", "005", "003"]);
        assert_eq!(ids(&bundle.top_students, "Grade")[3], "D");
        assert_eq!(ids(&bundle.top_students, "Predikat Wisuda")[3], "Cukup");
    }

    #[test]
    fn test_missing_source_aborts_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReportBundle::process(
            &dir.path().join("Data_Wisudawan.xlsx"),
            &ColumnNames::default(),
            5,
        )
        .unwrap_err();
        assert!(matches!(err, CohortError::SourceNotFound(_)));
    }

    #[test]
    fn test_workbook_has_four_named_sheets() {
        let bundle = bundle_from_csv();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rekap_wisuda_final.xlsx");

        bundle.write_workbook(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![
                "Data Wisudawan Lengkap",
                "Jumlah per Prodi",
                "Rata IPK per Prodi",
                "Top 5 IPK Tertinggi"
            ]
        );
        let students = workbook.worksheet_range("Data Wisudawan Lengkap").unwrap();
        // Header plus four students, six source columns plus Grade and Predikat.
        assert_eq!(students.get_size(), (5, 8));
    }
}
