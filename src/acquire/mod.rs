//! Acquisition of the hourly snapshots of one day.
//!
//! The month index is fetched and parsed for links, the links belonging to
//! the requested day are selected, and each selected snapshot is downloaded,
//! decompressed and loaded into its partition, one at a time.
//!
//! The first failure aborts the run. Partitions loaded earlier in the same
//! run are kept.

use std::path::PathBuf;

use reqwest::{Client, Url};

pub mod download;
pub mod filter;
pub mod index;
pub mod links;
pub mod loader;

use crate::PipelineError;
use download::{decompressed_path, download_to_file, gunzip, http_client};
use filter::{RemoteSnapshotRef, SnapshotDay, SnapshotFilter};
use loader::{Ingest, Loader};

pub const DEFAULT_BASE_URL: &str = "http://dumps.wikimedia.org/other/pagecounts-raw";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; U; Linux i686; it; rv:1.9.0.10) Gecko/2009042513 Ubuntu/8.04 (hardy) Firefox/3.0.10";

/// Settings of an acquisition run.
#[derive(Clone, Debug)]
pub struct AcquireConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Index, compressed and decompressed files are written here.
    pub work_dir: PathBuf,
    /// Two-digit hours skipped when a whole day is requested.
    pub excluded_hours: Vec<String>,
    pub report_progress: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            work_dir: PathBuf::from("./"),
            excluded_hours: Vec::new(),
            report_progress: true,
        }
    }
}

impl AcquireConfig {
    /// `<base>/<year>/<year>-<month>/`
    pub fn month_url(&self, year: u16, month: u8) -> String {
        format!(
            "{}/{year:04}/{year:04}-{month:02}/",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// What a run should fetch: a day, optionally pinned to one `hour:minute`.
#[derive(Copy, Clone, Debug)]
pub struct SnapshotRequest {
    pub day: SnapshotDay,
    pub at: Option<(u8, u8)>,
}

/// Downloads and unpacks single snapshots.
pub struct Acquirer<'a> {
    client: &'a Client,
    config: &'a AcquireConfig,
    month_url: Url,
}

impl<'a> Acquirer<'a> {
    pub fn new(client: &'a Client, config: &'a AcquireConfig, day: SnapshotDay) -> Result<Self, PipelineError> {
        let month_url = config.month_url(day.year, day.month);
        let month_url = Url::parse(&month_url).map_err(|e| PipelineError::parse(month_url, e))?;
        Ok(Self {
            client,
            config,
            month_url,
        })
    }

    /// Fetches `link` relative to the month directory and returns the path
    /// of the decompressed copy. The compressed download is removed.
    pub async fn acquire(&self, link: &str) -> Result<PathBuf, PipelineError> {
        let url = self
            .month_url
            .join(link)
            .map_err(|e| PipelineError::parse(link, e))?;
        let compressed = self.config.work_dir.join(link);
        let decompressed = decompressed_path(&compressed);

        download_to_file(self.client, url.as_str(), &compressed, self.config.report_progress).await?;
        gunzip(&compressed, &decompressed).await?;
        tokio::fs::remove_file(&compressed).await?;
        Ok(decompressed)
    }
}

/// Runs a whole acquisition and returns how many snapshots were loaded.
///
/// Finding nothing to fetch is not an error; it is logged and `Ok(0)` is
/// returned.
pub async fn run<I: Ingest>(
    config: &AcquireConfig,
    request: SnapshotRequest,
    ingest: I,
) -> Result<usize, PipelineError> {
    let client = http_client(&config.user_agent)?;
    tokio::fs::create_dir_all(&config.work_dir).await?;

    let day = request.day;
    let index_path = index::fetch_index(&client, config, day.year, day.month).await?;
    let parsed = links::extract_links_from_file(&index_path).await;
    tokio::fs::remove_file(&index_path).await?;
    let links = parsed?;

    let selected = SnapshotFilter::new(day, request.at, &config.excluded_hours).select(&links);
    if selected.is_empty() {
        log::warn!("No URL matches requirements for {}. Shutting down.", day.ymd());
        return Ok(0);
    }

    let acquirer = Acquirer::new(&client, config, day)?;
    let loader = Loader::new(ingest);
    let total = selected.len();
    for (i, link) in selected.iter().enumerate() {
        log::info!("Downloading {link}... [{}/{total}]", i + 1);
        let snapshot: RemoteSnapshotRef = link.parse()?;
        let local = acquirer.acquire(link).await?;
        let partition = loader.load(&local, &snapshot).await?;
        log::debug!("{link} loaded into ds={partition}");
    }
    Ok(total)
}
