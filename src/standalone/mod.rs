//! Single-process execution of a MapReduce job.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use bytes::Bytes;

use crate::{workload, KeyValue};

pub mod engine;

#[derive(Debug, Clone)]
pub struct Job {
    /// Data files to map over.
    pub inputs: Vec<PathBuf>,
    pub workload: String,
    /// Directory receiving the `mr-out-*` files. Replaced if it exists.
    pub output: PathBuf,
    /// Auxiliary arguments to pass to the MapReduce application.
    pub args: Vec<String>,
    pub n_reduce: u32,
}

/// Runs `job` to completion and returns what the reduce workers drained.
///
/// The reducer count is checked against the workload's topology before any
/// input is read.
pub fn run(job: &Job) -> Result<Vec<KeyValue>> {
    let engine = workload::named(&job.workload)?;
    engine.check_reducers(job.n_reduce)?;

    if job.output.exists() {
        log::info!("Replacing output directory {}", job.output.display());
        fs::remove_dir_all(&job.output)?;
    }
    fs::create_dir_all(&job.output)?;

    let serialized_args = Bytes::from(serde_json::to_string(&job.args)?);
    /*  The map logic carries out mapping and also shuffle. This makes sense in
     *  the case of a standalone system.
     */
    let buckets = engine::perform_map(job, &engine, &serialized_args, job.n_reduce)?;
    engine::perform_reduce(job, &engine, &serialized_args, buckets)
}
