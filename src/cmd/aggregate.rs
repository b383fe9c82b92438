use std::path::PathBuf;

use clap::Parser;

use crate::partition::{PartitionResolver, DEFAULT_DATABASE, DEFAULT_TABLE, DEFAULT_WAREHOUSE};

#[derive(Parser, Debug)]
#[command(version, about = "Find the most visited context of a day", long_about = None)]
pub struct Args {
    pub year: u16,
    #[arg(value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: u8,
    #[arg(value_parser = clap::value_parser!(u8).range(1..=31))]
    pub day: u8,

    #[arg(long, env = "HIVE_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
    pub warehouse: PathBuf,
    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,
    /// Results go to <OUTPUT_ROOT>/mes_vista_YYYY-MM-DD
    #[arg(short, long, default_value = "/user/olopez")]
    pub output_root: PathBuf,
    /// Reduce workers. The most-visited workload only accepts 1.
    #[arg(short = 'r', long, default_value_t = 1)]
    pub reducers: u32,
}

impl Args {
    pub fn ymd(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }

    pub fn resolver(&self) -> PartitionResolver {
        PartitionResolver::from_parts(&self.warehouse, &self.database, &self.table)
    }

    pub fn output(&self) -> PathBuf {
        self.output_root.join(format!(
            "mes_vista_{:04}-{:02}-{:02}",
            self.year, self.month, self.day
        ))
    }
}
