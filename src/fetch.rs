//! Archive download and payload extraction
//!
//! The archive is streamed to disk and then fully unpacked. The payload is
//! taken to be the largest member by uncompressed size; an archive carrying
//! several large files may therefore yield the wrong one.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::utils::archive_filename_from_url;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};

/// Member chosen as payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadMember {
    /// Index of the entry inside the archive
    pub index: usize,
    /// Relative path of the entry
    pub name: PathBuf,
    /// Uncompressed size in bytes
    pub size: u64,
}

/// Downloads an archive and unpacks its payload
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ArchiveFetcher {
    /// Create a fetcher with its own HTTP client
    pub fn new(config: FetchConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::config(
                "chunk size must be a positive number of bytes",
                "fetch.chunk_size",
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Download `url` and return the extracted payload path
    pub async fn fetch(
        &self,
        url: &str,
        download_dir: &Path,
        extract_dir: &Path,
    ) -> Result<PathBuf> {
        let archive = self.download(url, download_dir).await?;
        extract_payload_blocking(archive, extract_dir.to_path_buf()).await
    }

    /// Stream `url` into `dest_dir/<last path segment>`
    ///
    /// The body is written in pieces of at most `chunk_size` bytes. A partial
    /// file is left behind if the transfer fails.
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        if url.trim().is_empty() {
            return Err(Error::config("download URL is empty", "download_link"));
        }

        let file_name = archive_filename_from_url(url);
        let archive_path = dest_dir.join(&file_name);
        info!(url, ?archive_path, "downloading archive");

        let mut response = self.client.get(url).send().await.map_err(|e| {
            error!(
                url,
                error = %e,
                timeout = e.is_timeout(),
                connect = e.is_connect(),
                "couldn't download the archive"
            );
            Error::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url, %status, "archive host returned an error status");
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let mut file = tokio::fs::File::create(&archive_path).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to create '{}': {}", archive_path.display(), e),
            )
        })?;

        let mut total: u64 = 0;
        while let Some(bytes) = response.chunk().await.map_err(|e| {
            error!(url, error = %e, received = total, "archive transfer interrupted");
            Error::Network(e)
        })? {
            for piece in bytes.chunks(self.config.chunk_size) {
                file.write_all(piece).await?;
            }
            total += bytes.len() as u64;
        }
        file.flush().await?;

        info!(?archive_path, bytes = total, "downloaded archive");
        Ok(archive_path)
    }
}

async fn extract_payload_blocking(archive: PathBuf, extract_dir: PathBuf) -> Result<PathBuf> {
    spawn_blocking(move || extract_payload(&archive, &extract_dir)).await?
}

/// Unpack every member of `archive` into `extract_dir` and return the path of
/// the largest one
pub fn extract_payload(archive_path: &Path, extract_dir: &Path) -> Result<PathBuf> {
    info!(?archive_path, ?extract_dir, "extracting archive");

    std::fs::create_dir_all(extract_dir).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to create destination '{}': {}", extract_dir.display(), e),
        )
    })?;

    let file = std::fs::File::open(archive_path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to open archive '{}': {}", archive_path.display(), e),
        )
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_error(archive_path, e))?;

    let payload = select_payload(&mut archive, archive_path)?;

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| archive_error(archive_path, e))?;
        extract_entry(entry, extract_dir)?;
    }

    let payload_path = extract_dir.join(&payload.name);
    info!(
        member = %payload.name.display(),
        size = payload.size,
        "extracted payload"
    );
    Ok(payload_path)
}

/// Pick the largest file member; the first one wins on equal sizes
pub fn select_payload<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    archive_path: &Path,
) -> Result<PayloadMember> {
    let mut best: Option<PayloadMember> = None;

    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| archive_error(archive_path, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        debug!(member = %name.display(), size = entry.size(), "archive member");

        if best.as_ref().is_none_or(|b| entry.size() > b.size) {
            best = Some(PayloadMember {
                index: i,
                name,
                size: entry.size(),
            });
        }
    }

    best.ok_or_else(|| Error::Archive {
        archive: archive_path.to_path_buf(),
        reason: "archive contains no extractable files".to_string(),
    })
}

/// Write a single entry below `dest_path`, creating directories as needed
fn extract_entry(
    mut entry: zip::read::ZipFile<'_>,
    dest_path: &Path,
) -> Result<Option<PathBuf>> {
    let file_path = match entry.enclosed_name() {
        Some(path) => dest_path.join(path),
        None => {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if entry.is_dir() {
        std::fs::create_dir_all(&file_path)?;
        return Ok(None);
    }

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to create '{}': {}", file_path.display(), e),
        )
    })?;
    std::io::copy(&mut entry, &mut outfile)?;

    debug!(?file_path, "extracted member");
    Ok(Some(file_path))
}

fn archive_error(archive: &Path, e: zip::result::ZipError) -> Error {
    Error::Archive {
        archive: archive.to_path_buf(),
        reason: e.to_string(),
    }
}
