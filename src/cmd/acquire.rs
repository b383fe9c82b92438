use std::path::PathBuf;

use clap::Parser;

use crate::acquire::filter::SnapshotDay;
use crate::acquire::{AcquireConfig, SnapshotRequest, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::partition::DEFAULT_TABLE;

#[derive(Parser, Debug)]
#[command(version, about = "Load a day of pagecounts snapshots into the warehouse", long_about = None)]
pub struct Args {
    pub year: u16,
    #[arg(value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: u8,
    #[arg(value_parser = clap::value_parser!(u8).range(1..=31))]
    pub day: u8,
    /// Only fetch the snapshot published at this hour (needs MINUTE)
    #[arg(requires = "minute", value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour: Option<u8>,
    #[arg(requires = "hour", value_parser = clap::value_parser!(u8).range(0..=59))]
    pub minute: Option<u8>,

    /// Root of the snapshot archive
    #[arg(long, env = "PAGECOUNTS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    #[arg(long, env = "PAGECOUNTS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Where downloads are staged
    #[arg(short, long, env = "PAGECOUNTS_WORK_DIR", default_value = "./")]
    pub work_dir: PathBuf,
    /// Comma separated hours skipped when fetching a whole day
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude_hours: Vec<String>,
    /// Do not log download progress
    #[arg(long)]
    pub no_progress: bool,

    /// Copy snapshots into this table directory instead of calling hive
    #[arg(long)]
    pub local_table: Option<PathBuf>,
    #[arg(long, env = "HIVE_BIN", default_value = "hive")]
    pub hive_bin: String,
    /// Fully qualified table the snapshots are loaded into
    #[arg(long, default_value_t = format!("dcitera_olopez.{DEFAULT_TABLE}"))]
    pub table: String,
}

impl Args {
    pub fn request(&self) -> SnapshotRequest {
        SnapshotRequest {
            day: SnapshotDay::new(self.year, self.month, self.day),
            at: self.hour.zip(self.minute),
        }
    }

    pub fn config(&self) -> AcquireConfig {
        AcquireConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            work_dir: self.work_dir.clone(),
            excluded_hours: self.exclude_hours.clone(),
            report_progress: !self.no_progress,
        }
    }
}
