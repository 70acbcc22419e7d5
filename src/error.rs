use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, transforms, or emits equipment-state data.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when XML parsing or serialization fails.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the parsed markup does not follow the expected shape,
    /// e.g. a wrong root tag or a node without a name.
    #[error("schema violation: {0}")]
    Schema(String),

    /// Raised when a tabular file does not carry the expected columns or
    /// sheet layout.
    #[error("invalid table structure: {0}")]
    InvalidTable(String),

    /// Raised when the reconstruction cursor finishes with unconsumed rows;
    /// carries the first row whose parent was never offered during the walk.
    #[error("reconstruction failed at row {index}: parent '{parent}' of '{path}' was never built")]
    Reconstruction {
        index: usize,
        parent: String,
        path: String,
    },

    /// Raised when the CLI receives an unsupported conversion request.
    #[error("unsupported conversion from {from:?} to {to:?}")]
    UnsupportedConversion { from: String, to: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
