//! Error Module
//! Closed set of abort causes for a report run.

use std::path::PathBuf;
use thiserror::Error;

/// Every way a run can abort. Callers match on the variant, not the message.
#[derive(Error, Debug)]
pub enum CohortError {
    #[error("File '{}' not found", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Cannot read '{}': {reason}", .path.display())]
    SourceUnreadable { path: PathBuf, reason: String },
    #[error("Column not found: '{0}'")]
    MissingColumn(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, CohortError>;

impl CohortError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CohortError::InvalidValue(msg.into())
    }

    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        CohortError::Unexpected(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for CohortError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        CohortError::unexpected(err)
    }
}

impl From<std::io::Error> for CohortError {
    fn from(err: std::io::Error) -> Self {
        CohortError::unexpected(err)
    }
}

impl From<zip::result::ZipError> for CohortError {
    fn from(err: zip::result::ZipError) -> Self {
        CohortError::unexpected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        let err = CohortError::SourceNotFound(PathBuf::from("Data_Wisudawan.xlsx"));
        assert_eq!(err.to_string(), "File 'Data_Wisudawan.xlsx' not found");

        let err = CohortError::MissingColumn("IPK".to_string());
        assert_eq!(err.to_string(), "Column not found: 'IPK'");
    }

    #[test]
    fn test_io_error_is_unexpected() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(matches!(CohortError::from(io), CohortError::Unexpected(_)));
    }
}
