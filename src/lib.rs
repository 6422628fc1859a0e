//! # firds-dl
//!
//! One-shot converter for ESMA FIRDS reference data.
//!
//! A run reads the `download_link` out of a small search-service response
//! (`response.xml`), downloads the zip archive it points to, unpacks the
//! largest member as the payload document, streams through that document
//! collecting one record per `FinInstrmGnlAttrbts` window, and writes the
//! records to `results.csv`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use firds_dl::{Config, run};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = run(&Config::default()).await?;
//!     println!("wrote {} records to {}", summary.records, summary.output.display());
//!     Ok(())
//! }
//! ```
//!
//! The stages are also usable on their own:
//!
//! ```
//! use firds_dl::{RecordExtractor, config::SchemaConfig};
//!
//! let schema = SchemaConfig {
//!     namespace: String::new(),
//!     attribute: "Attrs".into(),
//!     fields: vec!["Id".into(), "Issr".into()],
//! };
//! let xml = "<r><Attrs><Id>A1</Id></Attrs><Issr>X</Issr></r>";
//! let extraction = RecordExtractor::new(&schema)?.extract(xml.as_bytes())?;
//! assert_eq!(extraction.records[0].get("Id"), Some("A1"));
//! # Ok::<(), firds_dl::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// CSV output
pub mod csv_output;
/// Error types
pub mod error;
/// Streaming record extraction
pub mod extractor;
/// Archive download and extraction
pub mod fetch;
/// Download link lookup
pub mod link;
/// End-to-end run
pub mod pipeline;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, FetchConfig, PathsConfig, SchemaConfig};
pub use csv_output::{write_csv, write_records};
pub use error::{Error, Result};
pub use extractor::{Extraction, Record, RecordExtractor, WindowState};
pub use fetch::{ArchiveFetcher, extract_payload};
pub use link::{find_download_link, find_download_link_in_file};
pub use pipeline::{RunSummary, run};
