//! Configuration Module
//! Run settings loaded from an optional `cohort_report.json`.

use crate::error::{CohortError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "cohort_report.json";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source spreadsheet (or CSV).
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Destination workbook, overwritten on every run.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Directory for chart PNGs. `null` skips chart rendering.
    #[serde(default = "default_chart_dir")]
    pub chart_dir: Option<PathBuf>,

    /// Open each rendered chart in the system image viewer.
    #[serde(default = "default_open_charts")]
    pub open_charts: bool,

    /// Rows shown in the console preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Size of the highest-GPA table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Enable debug logging.
    #[serde(default)]
    pub verbose: bool,

    /// Required column headers of the source.
    #[serde(default)]
    pub columns: ColumnNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            chart_dir: default_chart_dir(),
            open_charts: default_open_charts(),
            preview_rows: default_preview_rows(),
            top_n: default_top_n(),
            verbose: false,
            columns: ColumnNames::default(),
        }
    }
}

fn default_source() -> PathBuf {
    PathBuf::from("Data_Wisudawan.xlsx")
}

fn default_output() -> PathBuf {
    PathBuf::from("rekap_wisuda_final.xlsx")
}

fn default_chart_dir() -> Option<PathBuf> {
    Some(PathBuf::from("charts"))
}

fn default_open_charts() -> bool {
    true
}

fn default_preview_rows() -> usize {
    10
}

fn default_top_n() -> usize {
    5
}

/// Header names of the required columns, matched against trimmed headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id: String,
    pub name: String,
    pub program: String,
    pub gpa: String,
    pub duration: String,
    pub year: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "NIM".to_string(),
            name: "Nama Mahasiswa".to_string(),
            program: "Program Studi".to_string(),
            gpa: "IPK".to_string(),
            duration: "Lama Studi (Semester)".to_string(),
            year: "Tahun Wisuda".to_string(),
        }
    }
}

impl ColumnNames {
    /// All required columns, in source-schema order.
    pub fn required(&self) -> [&str; 6] {
        [
            self.id.as_str(),
            self.name.as_str(),
            self.program.as_str(),
            self.gpa.as_str(),
            self.duration.as_str(),
            self.year.as_str(),
        ]
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CohortError::invalid(format!("cannot read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            CohortError::invalid(format!("cannot parse config {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `cohort_report.json` from the current directory, or defaults when absent.
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(CohortError::invalid("top_n must be at least 1"));
        }
        if self.preview_rows == 0 {
            return Err(CohortError::invalid("preview_rows must be at least 1"));
        }

        let mut seen = HashSet::new();
        for name in self.columns.required() {
            if name.trim().is_empty() {
                return Err(CohortError::invalid("column names must not be empty"));
            }
            if name.trim() != name {
                return Err(CohortError::invalid(format!(
                    "column '{}' has surrounding whitespace; source headers are trimmed",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(CohortError::invalid(format!(
                    "column '{}' is configured twice",
                    name
                )));
            }
        }
        Ok(())
    }
}
