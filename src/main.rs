//! firds-dl command line entry point
//!
//! Loads the configuration, applies flag overrides and runs the conversion
//! once. Exits with status 1 on any failure.

use clap::Parser;
use firds_dl::{Config, Error, Result, run};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Convert a FIRDS reference archive into CSV
#[derive(Parser, Debug)]
#[command(name = "firds-dl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference document holding the download link
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// CSV output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory the archive is saved into
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Directory the archive is unpacked into
    #[arg(long)]
    extract_dir: Option<PathBuf>,

    /// Bytes written per write call while downloading
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(input) = self.input {
            config.paths.input = input;
        }
        if let Some(output) = self.output {
            config.paths.output = output;
        }
        if let Some(dir) = self.download_dir {
            config.paths.download_dir = dir;
        }
        if let Some(dir) = self.extract_dir {
            config.paths.extract_dir = dir;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.fetch.chunk_size = chunk_size;
        }
        if let Some(secs) = self.timeout {
            config.fetch.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return report(Error::Io(e)),
    };

    let result = cli
        .into_config()
        .map(|config| runtime.block_on(async move { run(&config).await }));

    match result {
        Ok(Ok(summary)) => {
            info!(
                records = summary.records,
                output = %summary.output.display(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) | Err(e) => report(e),
    }
}

fn report(e: Error) -> ExitCode {
    error!(code = e.error_code(), error = %e, "aborting");
    ExitCode::FAILURE
}
