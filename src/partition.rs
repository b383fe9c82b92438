//! Locating the data files of a day's partitions.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use regex::Regex;

use crate::PipelineError;

pub const DEFAULT_WAREHOUSE: &str = "/user/hive/warehouse";
pub const DEFAULT_DATABASE: &str = "dcitera_olopez.db";
pub const DEFAULT_TABLE: &str = "bda_wikidump_dcitera_olopez";

/// Resolves partitions of one table laid out as `<root>/ds=YYYYMMDD-HHMM/`.
#[derive(Clone, Debug)]
pub struct PartitionResolver {
    root: PathBuf,
}

impl PartitionResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<warehouse>/<database>/<table>`
    pub fn from_parts(warehouse: impl AsRef<Path>, database: &str, table: &str) -> Self {
        Self::new(warehouse.as_ref().join(database).join(table))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns every data file of every partition whose key falls on `ymd`
    /// (`YYYYMMDD`). Hidden files (`.` or `_` prefixed) are skipped, as the
    /// table's writers leave staging and marker files there.
    pub fn resolve(&self, ymd: &str) -> Result<Vec<PathBuf>, PipelineError> {
        let name = Regex::new(&format!(r"^ds={}-\d{{4}}$", regex::escape(ymd)))
            .map_err(|e| PipelineError::parse(ymd, e))?;
        let pattern = format!(
            "{}/ds={}-*",
            Pattern::escape(&self.root.to_string_lossy()),
            Pattern::escape(ymd)
        );

        let mut partitions = glob(&pattern)
            .map_err(|e| PipelineError::parse(pattern.clone(), e))?
            .flatten()
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .map(|n| name.is_match(&n.to_string_lossy()))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        if partitions.is_empty() {
            return Err(PipelineError::NotFound(ymd.to_string()));
        }
        partitions.sort();

        let mut files = Vec::new();
        for partition in partitions {
            let mut found = fs::read_dir(&partition)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && !is_hidden(p))
                .collect::<Vec<_>>();
            if found.is_empty() {
                log::warn!("Partition {} holds no data files", partition.display());
            }
            found.sort();
            for f in &found {
                log::debug!("input file {}", f.display());
            }
            files.extend(found);
        }
        Ok(files)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| {
            let n = n.to_string_lossy();
            n.starts_with('.') || n.starts_with('_')
        })
        .unwrap_or(true)
}
