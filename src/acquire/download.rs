//! Streaming HTTP downloads and gzip decompression.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::PipelineError;

const GZIP_SUFFIX: &str = ".gz";

/// Builds the HTTP client shared by every transfer of a run.
pub fn http_client(user_agent: &str) -> Result<Client, PipelineError> {
    Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| PipelineError::transfer("<client>", e))
}

/// Percent-complete tracking for a transfer.
///
/// Silent when disabled or when the total length is unknown or zero.
#[derive(Debug, Clone)]
pub struct Progress {
    total: Option<u64>,
    last_percent: Option<u64>,
}

impl Progress {
    pub fn new(total: Option<u64>, enabled: bool) -> Self {
        Self {
            total: total.filter(|len| enabled && *len > 0),
            last_percent: None,
        }
    }

    /// Returns the new percentage when `written` crossed into one not
    /// reported yet.
    pub fn update(&mut self, written: u64) -> Option<u64> {
        let percent = written.saturating_mul(100) / self.total?;
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}

/// Streams `url` into `dest`, returning the number of bytes written.
///
/// When the server announces a length and `report_progress` is set, a line is
/// logged every time the completed percentage changes.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    report_progress: bool,
) -> Result<u64, PipelineError> {
    let mut res = client
        .get(url)
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| PipelineError::transfer(url, e))?;

    let total = res.content_length();
    if let Some(len) = total.filter(|len| *len > 0) {
        log::info!("Filesize: {len}");
    }

    let mut out = tokio::fs::File::create(dest)
        .await
        .map_err(|e| PipelineError::transfer(url, e))?;
    let mut written: u64 = 0;
    let mut progress = Progress::new(total, report_progress);
    while let Some(chunk) = res.chunk().await.map_err(|e| PipelineError::transfer(url, e))? {
        out.write_all(&chunk)
            .await
            .map_err(|e| PipelineError::transfer(url, e))?;
        written += chunk.len() as u64;
        log::trace!("{url}: {written} bytes received");

        if let Some(percent) = progress.update(written) {
            log::info!("Downloaded {percent}%");
        }
    }
    out.flush().await.map_err(|e| PipelineError::transfer(url, e))?;
    Ok(written)
}

/// `foo.gz` -> `foo`. Paths without the suffix are returned unchanged.
pub fn decompressed_path(compressed: &Path) -> PathBuf {
    let name = compressed.to_string_lossy();
    match name.strip_suffix(GZIP_SUFFIX) {
        Some(stripped) => PathBuf::from(stripped),
        None => compressed.to_path_buf(),
    }
}

fn gunzip_blocking(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut out = BufWriter::new(File::create(dst)?);
    let n = io::copy(&mut decoder, &mut out)?;
    out.flush()?;
    Ok(n)
}

/// Decompresses `src` into `dst` on the blocking pool.
pub async fn gunzip(src: &Path, dst: &Path) -> Result<u64, PipelineError> {
    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    let path = src.clone();
    let decompression = |reason: String| PipelineError::Decompression {
        path: path.clone(),
        reason,
    };
    let n = tokio::task::spawn_blocking(move || gunzip_blocking(&src, &dst))
        .await
        .map_err(|e| decompression(e.to_string()))?
        .map_err(|e| decompression(e.to_string()))?;
    log::info!("Done unzipping file");
    Ok(n)
}
