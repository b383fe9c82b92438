//! The most visited context of a day.
//!
//! Map turns every snapshot line into `(context, requests)`. The reduce side
//! is a single [`MaxRequests`] worker that sees every context in key order
//! and keeps a running maximum across all of them, so this workload is only
//! correct with one reduce worker.

use std::collections::BTreeMap;
use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;

use crate::record::{decode_requests, hour_from_path, AggregationResult, CountRecord};
use crate::utils::string_from_bytes;
use crate::*;

pub fn map(kv: KeyValue, _aux: Bytes) -> MapOutput {
    let path = string_from_bytes(kv.key())?;
    let hour = hour_from_path(&path).unwrap_or(0);
    let content = String::from_utf8_lossy(&kv.value).into_owned();
    let records = content
        .lines()
        .filter_map(|line| CountRecord::parse_line(line, hour))
        .collect::<Vec<_>>();
    log::debug!("{}: {} count records for hour {:02}", path, records.len(), hour);

    Ok(Box::new(
        records.into_iter().map(|rec| Ok(rec.into_key_value())),
    ))
}

pub fn reducer(_aux: Bytes) -> Result<Box<dyn ReduceWorker>> {
    Ok(Box::new(MaxRequests::new()))
}

/// Streaming arg-max over summed requests.
///
/// Both the running maximum and the candidate map live for the whole job.
/// Each prefix sum of a context that reaches the running maximum raises it
/// and overwrites that context's candidate entry. Draining emits every
/// candidate whose last recorded total equals the final maximum. A context
/// recorded early at a smaller maximum keeps its stale value and is left
/// out unless that value happens to equal the final maximum.
#[derive(Debug, Default)]
pub struct MaxRequests {
    running_max: u64,
    candidates: BTreeMap<String, u64>,
}

impl MaxRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one context group into the running state.
    pub fn accumulate<I>(&mut self, context: &str, values: I)
    where
        I: IntoIterator<Item = u64>,
    {
        match self.try_accumulate::<_, Infallible>(context, values.into_iter().map(Ok)) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Like [`MaxRequests::accumulate`], pulling values one at a time. The
    /// first error stops the fold; prefixes already seen stay applied.
    pub fn try_accumulate<I, E>(&mut self, context: &str, values: I) -> std::result::Result<(), E>
    where
        I: IntoIterator<Item = std::result::Result<u64, E>>,
    {
        let mut total: u64 = 0;
        for v in values {
            total = total.saturating_add(v?);
            if total >= self.running_max {
                self.running_max = total;
                self.candidates.insert(context.to_string(), total);
            }
        }
        Ok(())
    }

    pub fn running_max(&self) -> u64 {
        self.running_max
    }

    pub fn candidates(&self) -> &BTreeMap<String, u64> {
        &self.candidates
    }

    /// Ends accumulation and yields the contexts holding the maximum.
    pub fn drain(self) -> Vec<AggregationResult> {
        let max = self.running_max;
        self.candidates
            .into_iter()
            .filter(|(_, total)| *total == max)
            .map(|(context, total)| AggregationResult::new(context, total))
            .collect()
    }
}

impl ReduceWorker for MaxRequests {
    fn reduce(&mut self, key: Bytes, values: Box<dyn Iterator<Item = Bytes> + '_>) -> Result<()> {
        let context = string_from_bytes(key)?;
        self.try_accumulate(&context, values.map(decode_requests))
    }

    fn cleanup(self: Box<Self>) -> Result<Vec<KeyValue>> {
        log::info!("most visited total: {}", self.running_max);
        Ok(self
            .drain()
            .into_iter()
            .map(AggregationResult::into_key_value)
            .collect())
    }
}
