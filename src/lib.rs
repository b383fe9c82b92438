//! Hourly page-view snapshot acquisition and most-visited aggregation.
//!
//! Two pipelines live in this crate. [`acquire`] pulls the hourly
//! `pagecounts` snapshots published for one day, decompresses them and hands
//! each file to an ingestion backend that writes it into a `ds=YYYYMMDD-HHMM`
//! partition. [`standalone`] then runs a map/reduce job over a day's
//! partitions; the [`workload::most_visited`] application finds the context
//! with the highest summed request count.

use bytes::Bytes;
use std::hash::Hasher;

pub mod acquire;
pub mod cmd;
pub mod error;
pub mod partition;
pub mod record;
pub mod standalone;
pub mod utils;
pub mod workload;

pub use error::PipelineError;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// The output of an application map function.
///
/// There are 2 layers of [`anyhow::Result`]s here. The outer layer
/// accounts for errors that arise while creating the iterator.
/// The inner layer accounts for errors that occur during iteration.
pub type MapOutput = anyhow::Result<Box<dyn Iterator<Item = anyhow::Result<KeyValue>>>>;

/// A map function takes a key-value pair and auxiliary arguments.
///
/// It returns an iterator that yields new key-value pairs.
pub type MapFn = fn(kv: KeyValue, aux: Bytes) -> MapOutput;

/// State owned by one reduce worker for the lifetime of a job.
///
/// Every key group routed to a worker is passed to [`ReduceWorker::reduce`]
/// in key order, on the same instance. Once the last group has been
/// delivered the engine calls [`ReduceWorker::cleanup`], which consumes the
/// worker and returns everything it wants written out. State may therefore
/// span groups; a workload that relies on that must set
/// [`Workload::single_reducer`].
pub trait ReduceWorker {
    /// Folds one key and all of its values into the worker state.
    fn reduce(
        &mut self,
        key: Bytes,
        values: Box<dyn Iterator<Item = Bytes> + '_>,
    ) -> anyhow::Result<()>;

    /// Drains the worker. No more groups are delivered afterwards.
    fn cleanup(self: Box<Self>) -> anyhow::Result<Vec<KeyValue>>;
}

/// Builds a fresh reduce worker from the job's auxiliary arguments.
pub type ReducerFn = fn(aux: Bytes) -> anyhow::Result<Box<dyn ReduceWorker>>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub name: &'static str,
    pub map_fn: MapFn,
    pub reducer_fn: ReducerFn,
    /// Results are only correct when one worker sees every key.
    pub single_reducer: bool,
}

impl Workload {
    /// Rejects reducer counts the workload cannot produce correct output with.
    pub fn check_reducers(&self, n_reduce: u32) -> Result<(), PipelineError> {
        if n_reduce == 0 || (self.single_reducer && n_reduce != 1) {
            return Err(PipelineError::Topology {
                workload: self.name.to_string(),
                requested: n_reduce,
            });
        }
        Ok(())
    }
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyValue {
    /// The key.
    pub key: Bytes,
    /// The value.
    pub value: Bytes,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }

    /// Get the key of this key-value pair.
    ///
    /// This method is cheap, since [`Bytes`] are cheaply cloneable.
    #[inline]
    pub fn key(&self) -> Bytes {
        self.key.clone()
    }

    /// Get the value of this key-value pair.
    #[inline]
    pub fn value(&self) -> Bytes {
        self.value.clone()
    }

    /// Consumes the key-value pair and returns the value.
    #[inline]
    pub fn into_value(self) -> Bytes {
        self.value
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    // masked to 31 bits, always fits
    (hasher.finish() & 0x7fffffff) as u32
}
