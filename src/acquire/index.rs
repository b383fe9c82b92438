//! Month index retrieval.

use std::path::PathBuf;

use reqwest::Client;
use uuid::Uuid;

use super::download::download_to_file;
use super::AcquireConfig;
use crate::PipelineError;

/// Downloads the listing of `<base>/<year>/<year>-<month>/` into a uniquely
/// named file in the work directory. The caller removes it once parsed.
pub async fn fetch_index(
    client: &Client,
    config: &AcquireConfig,
    year: u16,
    month: u8,
) -> Result<PathBuf, PipelineError> {
    let url = format!("{}index.html", config.month_url(year, month));
    let dest = config.work_dir.join(format!("index-{}.html", Uuid::new_v4()));
    log::info!("Downloading index file {url}...");
    download_to_file(client, &url, &dest, config.report_progress).await?;
    log::info!("Done downloading index");
    Ok(dest)
}
