use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ConsolidateError>;

/// Error type covering the different failure cases that can occur while files
/// are queued, consolidated, or written back out.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// An input file could not be decoded. Aborts the whole run.
    #[error("error processing files: '{file}' could not be read ({source})")]
    Decode {
        file: String,
        #[source]
        source: DecodeError,
    },

    /// Every sheet of every file was empty.
    #[error("no data found in the selected files")]
    NoData,

    /// Building the output workbook failed. The held result is left intact.
    #[error("failed to generate download file: {0}")]
    Serialization(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a second consolidation is requested while one is active.
    #[error("a consolidation is already running")]
    AlreadyRunning,

    /// Raised when an export is requested before any successful run.
    #[error("no consolidated result available; run a consolidation first")]
    NoResult,

    /// Raised when a column selection cannot be parsed or is inconsistent.
    #[error("invalid column selection: {0}")]
    InvalidColumns(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Wrapper for IO failures such as reading inputs or writing the download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization of the status summary fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ConsolidateError {
    pub(crate) fn decode(file: &str, source: impl Into<DecodeError>) -> Self {
        ConsolidateError::Decode {
            file: file.to_string(),
            source: source.into(),
        }
    }
}

/// Underlying reason an input file failed to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Errors bubbled up from the spreadsheet reader.
    #[error("{0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Errors bubbled up from the delimited text reader.
    #[error("{0}")]
    Delimited(#[from] csv::Error),

    /// The bytes matched none of the supported formats.
    #[error("unsupported file format")]
    UnsupportedFormat,
}
