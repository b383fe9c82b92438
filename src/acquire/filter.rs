//! Selecting the snapshot files of one day out of a month index.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::record::PartitionKey;
use crate::PipelineError;

fn snapshot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^pagecounts-(\d{4})(\d{2})(\d{2})-(\d{2})(\d{2})\d{2}\.gz$")
            .expect("snapshot pattern is valid")
    })
}

/// The day a run acquires snapshots for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SnapshotDay {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl SnapshotDay {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// `YYYYMMDD`, the prefix shared by snapshot names and partition keys.
    pub fn ymd(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// Date and time embedded in a snapshot file name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RemoteSnapshotRef {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl RemoteSnapshotRef {
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.year, self.month, self.day, self.hour, self.minute)
    }
}

impl FromStr for RemoteSnapshotRef {
    type Err = PipelineError;

    fn from_str(link: &str) -> Result<Self, PipelineError> {
        let caps = snapshot_pattern()
            .captures(link)
            .ok_or_else(|| PipelineError::parse(link, "not a pagecounts snapshot name"))?;
        let field = |i: usize| -> Result<u16, PipelineError> {
            caps[i].parse().map_err(|e| PipelineError::parse(link, e))
        };
        Ok(RemoteSnapshotRef {
            year: field(1)?,
            month: field(2)?.try_into().map_err(|e| PipelineError::parse(link, e))?,
            day: field(3)?.try_into().map_err(|e| PipelineError::parse(link, e))?,
            hour: field(4)?.try_into().map_err(|e| PipelineError::parse(link, e))?,
            minute: field(5)?.try_into().map_err(|e| PipelineError::parse(link, e))?,
        })
    }
}

/// Decides which links of a month index belong to a run.
#[derive(Clone, Debug)]
pub struct SnapshotFilter {
    ymd: String,
    at: Option<(u8, u8)>,
    excluded_hours: Vec<String>,
}

impl SnapshotFilter {
    /// `at` pins the run to one `hour:minute`; the exclusion list only
    /// applies when it is absent. Excluded hours are compared as two-digit
    /// strings, so `"7"` and `"07"` are the same hour.
    pub fn new(day: SnapshotDay, at: Option<(u8, u8)>, excluded_hours: &[String]) -> Self {
        let excluded_hours = excluded_hours
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(|h| match h.parse::<u8>() {
                Ok(n) => format!("{n:02}"),
                Err(_) => h.to_string(),
            })
            .collect();
        Self {
            ymd: day.ymd(),
            at,
            excluded_hours,
        }
    }

    pub fn matches(&self, link: &str) -> bool {
        let Some(caps) = snapshot_pattern().captures(link) else {
            return false;
        };
        let (ymd, hour, minute) = (
            format!("{}{}{}", &caps[1], &caps[2], &caps[3]),
            &caps[4],
            &caps[5],
        );
        if ymd != self.ymd {
            return false;
        }
        match self.at {
            Some((h, m)) => hour == format!("{h:02}") && minute == format!("{m:02}"),
            None => !self.excluded_hours.iter().any(|x| x == hour),
        }
    }

    /// Keeps the matching links in their original order.
    pub fn select<S: AsRef<str>>(&self, links: &[S]) -> Vec<String> {
        links
            .iter()
            .filter(|link| self.matches(link.as_ref()))
            .map(|link| link.as_ref().to_string())
            .collect()
    }
}
