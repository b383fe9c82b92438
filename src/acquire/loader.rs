//! Handing decompressed snapshots to the partitioned table.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::filter::RemoteSnapshotRef;
use crate::record::PartitionKey;
use crate::PipelineError;

/// Something able to load a local file into a dataset partition.
///
/// Returns the backend's exit status; zero means the data is in place.
#[allow(async_fn_in_trait)]
pub trait Ingest {
    async fn load(&self, path: &Path, partition: &PartitionKey) -> Result<i32, PipelineError>;
}

/// Loads through the `hive` command line client.
#[derive(Clone, Debug)]
pub struct HiveCli {
    pub bin: String,
    pub table: String,
}

impl HiveCli {
    pub fn new(bin: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            table: table.into(),
        }
    }

    pub fn query(&self, path: &Path, partition: &PartitionKey) -> String {
        format!(
            "LOAD DATA LOCAL INPATH '{}' OVERWRITE INTO TABLE {} PARTITION (ds='{}')",
            path.display(),
            self.table,
            partition
        )
    }
}

impl Ingest for HiveCli {
    async fn load(&self, path: &Path, partition: &PartitionKey) -> Result<i32, PipelineError> {
        let query = self.query(path, partition);
        log::info!("Executing query: {query}");
        let status = Command::new(&self.bin).arg("-e").arg(&query).status().await?;
        // killed by a signal
        Ok(status.code().unwrap_or(-1))
    }
}

/// Loads by copying into a local table directory, one `ds=<key>`
/// subdirectory per partition. An existing partition is replaced, like
/// `OVERWRITE` does.
#[derive(Clone, Debug)]
pub struct LocalTable {
    pub root: PathBuf,
}

impl LocalTable {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Ingest for LocalTable {
    async fn load(&self, path: &Path, partition: &PartitionKey) -> Result<i32, PipelineError> {
        let dir = self.root.join(partition.dir_name());
        if tokio::fs::try_exists(&dir).await? {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&dir).await?;
        let name = path
            .file_name()
            .ok_or_else(|| PipelineError::parse(path.to_string_lossy(), "no file name"))?;
        let n = tokio::fs::copy(path, dir.join(name)).await?;
        log::info!("Copied {n} bytes into {}", dir.display());
        Ok(0)
    }
}

/// Runs ingestion for one snapshot and cleans up after it.
pub struct Loader<I> {
    ingest: I,
}

impl<I: Ingest> Loader<I> {
    pub fn new(ingest: I) -> Self {
        Self { ingest }
    }

    /// Loads `local` into the partition named after `snapshot`. The file is
    /// deleted only once the backend reports success; on failure it stays
    /// on disk for inspection.
    pub async fn load(
        &self,
        local: &Path,
        snapshot: &RemoteSnapshotRef,
    ) -> Result<PartitionKey, PipelineError> {
        let partition = snapshot.partition_key();
        let path: PathBuf = tokio::fs::canonicalize(local).await?;
        let status = self.ingest.load(&path, &partition).await?;
        if status != 0 {
            log::error!("Something went wrong when importing {} (status {status})", path.display());
            return Err(PipelineError::Ingestion {
                path,
                partition: partition.to_string(),
                status,
            });
        }
        tokio::fs::remove_file(&path).await?;
        Ok(partition)
    }
}
