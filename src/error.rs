use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by acquisition, partition lookup and job setup.
///
/// Malformed snapshot lines are not errors: the map stage drops them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },
    #[error("could not parse {input:?}: {reason}")]
    Parse { input: String, reason: String },
    #[error("failed to decompress {}: {reason}", .path.display())]
    Decompression { path: PathBuf, reason: String },
    #[error("loading {} into partition ds={partition} exited with status {status}", .path.display())]
    Ingestion {
        path: PathBuf,
        partition: String,
        status: i32,
    },
    #[error("no partitions found for day {0}")]
    NotFound(String),
    #[error("workload `{workload}` cannot run on {requested} reduce workers")]
    Topology { workload: String, requested: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    pub(crate) fn transfer(url: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::Transfer {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(input: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::Parse {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}
