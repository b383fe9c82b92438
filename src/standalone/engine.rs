use anyhow::Result;
use bytes::Bytes;
use dashmap::DashMap;
use itertools::Itertools;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
};

use super::Job;
use crate::*;

// types related to this engine
type BucketIndex = u32;
type Buckets = DashMap<BucketIndex, Vec<KeyValue>>;

pub fn perform_map(
    job: &Job,
    engine: &Workload,
    serialized_args: &Bytes,
    num_reduce_worker: u32,
) -> Result<Buckets> {
    let buckets: Buckets = Buckets::new();
    for pathspec in &job.inputs {
        // Stores the data read from each file as <Filename, All data in file>
        let buf = Bytes::from(fs::read(pathspec)?);
        let filename = pathspec.to_string_lossy().into_owned();
        let input_kv = KeyValue {
            key: Bytes::from(filename),
            value: buf,
        };
        let map_func = engine.map_fn;
        // Every mapped pair goes to the bucket ihash(key) % workers picks
        for item in map_func(input_kv, serialized_args.clone())? {
            let KeyValue { key, value } = item?;
            let bucket_no = ihash(&key) % num_reduce_worker;

            #[allow(clippy::unwrap_or_default)]
            buckets
                .entry(bucket_no)
                .or_insert(Vec::new())
                .push(KeyValue { key, value });
        }
    }
    log::info!(
        "map done: {} inputs, {} buckets",
        job.inputs.len(),
        buckets.len()
    );

    Ok(buckets)
}

/// Hands each bucket to its own reduce worker.
///
/// Inside a bucket the keys are delivered in ascending byte order with the
/// values of a key in map order. After the last group the worker is
/// drained into `<output>/mr-out-<bucket>`, one tab separated pair per line.
pub fn perform_reduce(
    job: &Job,
    engine: &Workload,
    serialized_args: &Bytes,
    buckets: Buckets,
) -> Result<Vec<KeyValue>> {
    let mut drained = Vec::new();
    let buckets = buckets
        .into_iter()
        .sorted_by_key(|(reduce_id, _)| *reduce_id);
    for (reduce_id, mut bkt) in buckets {
        let mut worker = (engine.reducer_fn)(serialized_args.clone())?;
        bkt.sort_by_key(KeyValue::key);
        for (key, value_group) in &bkt.into_iter().chunk_by(KeyValue::key) {
            let iter = value_group.map(KeyValue::into_value);
            worker.reduce(key, Box::new(iter))?;
        }

        let out_pathspec = job.output.join(format!("mr-out-{}", reduce_id));
        let mut out_file = BufWriter::new(File::create(&out_pathspec)?);
        let output = worker.cleanup()?;
        for kv in &output {
            out_file.write_all(&kv.key)?;
            out_file.write_all(b"\t")?;
            out_file.write_all(&kv.value)?;
            out_file.write_all(b"\n")?;
        }
        out_file.flush()?;
        log::info!("{} pairs written to {}", output.len(), out_pathspec.display());
        drained.extend(output);
    }
    Ok(drained)
}
