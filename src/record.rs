//! Records flowing through the aggregation job.

use std::fmt;
use std::sync::OnceLock;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use regex::Regex;

use crate::utils::string_from_bytes;
use crate::KeyValue;

/// `<project> <context> <requests> <bytes>`. The first group is greedy, so a
/// context is always the second-to-last whitespace separated token pair.
/// Separators and counts are ASCII only; other Unicode spaces and digits
/// belong to the surrounding token.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+)((?-u:\s))(.+)((?-u:\s))([0-9]+)((?-u:\s))([0-9]+)$")
            .expect("line pattern is valid")
    })
}

fn partition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"ds=\d{8}-(\d{2})\d{2}").expect("partition pattern is valid"))
}

/// One snapshot line: requests counted against a context during an hour.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountRecord {
    pub context: String,
    pub hour: u32,
    pub requests: u64,
}

impl CountRecord {
    pub fn new(context: impl Into<String>, hour: u32, requests: u64) -> Self {
        Self {
            context: context.into(),
            hour,
            requests,
        }
    }

    /// Parses a snapshot line. Lines that do not have the four-field shape,
    /// or whose count overflows, yield `None`.
    pub fn parse_line(line: &str, hour: u32) -> Option<Self> {
        let caps = line_pattern().captures(line)?;
        let requests = caps.get(5)?.as_str().parse().ok()?;
        Some(Self::new(caps.get(3)?.as_str(), hour, requests))
    }

    /// Shuffle form: the context is the key, requests an 8 byte big-endian value.
    pub fn into_key_value(self) -> KeyValue {
        let mut value = BytesMut::with_capacity(8);
        value.put_u64(self.requests);
        KeyValue::new(Bytes::from(self.context), value.freeze())
    }
}

/// Decodes a value produced by [`CountRecord::into_key_value`].
pub fn decode_requests(mut value: Bytes) -> anyhow::Result<u64> {
    if value.len() != 8 {
        anyhow::bail!("expected an 8 byte request count, got {} bytes", value.len());
    }
    Ok(value.get_u64())
}

/// Extracts the hour from a path containing a `ds=YYYYMMDD-HHMM` segment.
pub fn hour_from_path(path: &str) -> Option<u32> {
    partition_pattern()
        .captures(path)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A context together with its summed requests, as emitted by the job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationResult {
    pub context: String,
    pub total_requests: u64,
}

impl AggregationResult {
    pub fn new(context: impl Into<String>, total_requests: u64) -> Self {
        Self {
            context: context.into(),
            total_requests,
        }
    }

    /// Output form: the value is the decimal total, matching the text
    /// written to the `mr-out-*` files.
    pub fn into_key_value(self) -> KeyValue {
        KeyValue::new(
            Bytes::from(self.context),
            Bytes::from(self.total_requests.to_string()),
        )
    }
}

impl TryFrom<KeyValue> for AggregationResult {
    type Error = anyhow::Error;

    fn try_from(kv: KeyValue) -> anyhow::Result<Self> {
        let context = string_from_bytes(kv.key())?;
        let total_requests = string_from_bytes(kv.into_value())?.trim().parse()?;
        Ok(Self {
            context,
            total_requests,
        })
    }
}

impl fmt::Display for AggregationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.context, self.total_requests)
    }
}

/// Key of a dataset partition, rendered as `YYYYMMDD-HHMM`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        PartitionKey(format!(
            "{year:04}{month:02}{day:02}-{hour:02}{minute:02}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name of the partition inside the table root.
    pub fn dir_name(&self) -> String {
        format!("ds={}", self.0)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_field_line() {
        let rec = CountRecord::parse_line("en Main_Page 242332 4737756101", 7).unwrap();
        assert_eq!(rec, CountRecord::new("Main_Page", 7, 242332));
    }

    #[test]
    fn greedy_prefix_keeps_last_context_token() {
        let rec = CountRecord::parse_line("en.b some title 3 100", 0).unwrap();
        assert_eq!(rec.context, "title");
        assert_eq!(rec.requests, 3);

        let rec = CountRecord::parse_line("en foo\u{a0}bar 12 100", 0).unwrap();
        assert_eq!(rec.context, "foo\u{a0}bar");
        assert_eq!(rec.requests, 12);
    }

    #[test]
    fn drops_malformed_lines() {
        assert_eq!(CountRecord::parse_line("", 0), None);
        assert_eq!(CountRecord::parse_line("en Main_Page 12", 0), None);
        assert_eq!(CountRecord::parse_line("en Main_Page twelve 100", 0), None);
        assert_eq!(
            CountRecord::parse_line("en Main_Page 99999999999999999999999 1", 0),
            None
        );
        // Arabic-Indic digits are not a byte count
        assert_eq!(CountRecord::parse_line("en foo 12 \u{661}\u{662}", 0), None);
    }

    #[test]
    fn key_value_carries_context_and_requests() {
        let kv = CountRecord::new("Foo", 3, 42).into_key_value();
        assert_eq!(kv.key, Bytes::from("Foo"));
        assert_eq!(decode_requests(kv.value).unwrap(), 42);
        assert!(decode_requests(Bytes::from_static(b"42")).is_err());
    }

    #[test]
    fn hour_comes_from_partition_segment() {
        assert_eq!(
            hour_from_path("/warehouse/t/ds=20131105-1300/000000_0"),
            Some(13)
        );
        assert_eq!(hour_from_path("/tmp/pagecounts-20131105-130000"), None);
    }

    #[test]
    fn aggregation_result_reads_back_from_output_pair() {
        let kv = AggregationResult::new("Main_Page", 20).into_key_value();
        assert_eq!(kv.value, Bytes::from("20"));
        let back = AggregationResult::try_from(kv).unwrap();
        assert_eq!(back.to_string(), "Main_Page\t20");
    }

    #[test]
    fn partition_key_is_zero_padded() {
        let key = PartitionKey::new(2013, 11, 5, 1, 0);
        assert_eq!(key.as_str(), "20131105-0100");
        assert_eq!(key.dir_name(), "ds=20131105-0100");
    }
}
