//! End-to-end conversion run
//!
//! LinkLocator → ArchiveFetcher → RecordExtractor → CsvWriter, each stage
//! awaited before the next starts.

use crate::config::Config;
use crate::csv_output::write_csv;
use crate::error::{Error, Result};
use crate::extractor::RecordExtractor;
use crate::fetch::ArchiveFetcher;
use crate::link::find_download_link_in_file;
use std::path::PathBuf;
use tokio::task::spawn_blocking;
use tracing::info;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Link read from the reference document
    pub download_link: String,
    /// Extracted payload document
    pub payload: PathBuf,
    /// Records written to the CSV
    pub records: usize,
    /// Open windows dropped at end of input
    pub dropped_partial: usize,
    /// CSV output file
    pub output: PathBuf,
}

/// Run the whole conversion described by `config`
pub async fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let input = config.paths.input.clone();
    let link = spawn_blocking({
        let input = input.clone();
        move || find_download_link_in_file(&input)
    })
    .await??;
    let download_link = link.ok_or(Error::LinkNotFound { path: input })?;

    let fetcher = ArchiveFetcher::new(config.fetch.clone())?;
    let payload = fetcher
        .fetch(
            &download_link,
            &config.paths.download_dir,
            &config.paths.extract_dir,
        )
        .await?;

    let extractor = RecordExtractor::new(&config.schema)?;
    let schema_fields = config.schema.fields.clone();
    let output = config.paths.output.clone();
    let payload_path = payload.clone();
    let (records, dropped_partial, output) = spawn_blocking(move || -> Result<_> {
        let extraction = extractor.extract_file(&payload_path)?;
        let output = write_csv(&output, &schema_fields, &extraction.records)?;
        Ok((extraction.records.len(), extraction.dropped_partial, output))
    })
    .await??;

    info!(
        records,
        dropped_partial,
        ?output,
        "conversion finished"
    );

    Ok(RunSummary {
        download_link,
        payload,
        records,
        dropped_partial,
        output,
    })
}
