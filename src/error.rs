//! Error types for firds-dl
//!
//! Every stage of the pipeline reports failures through [`Error`]. Nothing is
//! retried: the CLI logs the error once and exits with a non-zero status.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for firds-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for firds-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.chunk_size")
        key: Option<String>,
    },

    /// Configuration file could not be parsed
    #[error("failed to parse configuration file {path}: {reason}")]
    ConfigFile {
        /// The file that failed to parse
        path: PathBuf,
        /// Parser error message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure while talking to the archive host
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The archive host answered with a non-success status
    #[error("HTTP {status} while fetching {url}")]
    Http {
        /// The requested URL
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// Malformed XML in the reference or payload document
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Archive could not be read or unpacked
    #[error("archive error for {archive}: {reason}")]
    Archive {
        /// The archive file being processed
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The reference document holds no download link
    #[error("no download_link found in {path}")]
    LinkNotFound {
        /// The reference document that was scanned
        path: PathBuf,
    },

    /// A record lacks a column required by the field list
    #[error("record {record} has no value for field {field}")]
    MissingField {
        /// Zero-based index of the record in document order
        record: usize,
        /// The missing field name
        field: String,
    },

    /// Blocking stage panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Machine-readable error code used in structured log output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::ConfigFile { .. } => "config_file_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Http { .. } => "http_error",
            Error::Xml(_) => "xml_error",
            Error::Archive { .. } => "archive_error",
            Error::Csv(_) => "csv_error",
            Error::LinkNotFound { .. } => "link_not_found",
            Error::MissingField { .. } => "missing_field",
            Error::Task(_) => "task_error",
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(e.into())
    }
}

impl From<quick_xml::encoding::EncodingError> for Error {
    fn from(e: quick_xml::encoding::EncodingError) -> Self {
        Error::Xml(e.into())
    }
}
