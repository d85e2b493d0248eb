//! Error types for the recordsheet library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// A record field could not be read while rendering a row
    #[error("Unable to write data for column {column} field '{field}': {source}")]
    Conversion {
        column: u32,
        field: String,
        #[source]
        source: AccessError,
    },

    /// Destination is not writable, or the workbook could not be written to it
    #[error("Unable to generate excel file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two declared fields display-case to the same header
    #[error("Header '{header}' is declared by both field '{first}' and field '{second}'")]
    HeaderCollision {
        header: String,
        first: String,
        second: String,
    },

    /// Record type name cannot be used as a worksheet name
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// An earlier conversion or buffering failure poisoned this exporter
    #[error("Export was invalidated by an earlier failure: {reason}")]
    Invalidated { reason: String },
}

impl ExportError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure reported while resolving or invoking a field accessor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No accessor is registered under the expected name
    #[error("no accessor named '{accessor}'")]
    Missing { accessor: String },

    /// The accessor ran but could not produce a value
    #[error("accessor '{accessor}' failed: {message}")]
    Failed { accessor: String, message: String },
}

impl AccessError {
    /// Build a failure for use inside fallible accessors
    pub fn failed(accessor: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError::Failed {
            accessor: accessor.into(),
            message: message.into(),
        }
    }
}
