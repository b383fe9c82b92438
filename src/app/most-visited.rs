use anyhow::Result;
use clap::Parser;
use pagecounts::cmd::aggregate::Args;
use pagecounts::record::AggregationResult;
use pagecounts::standalone::{self, Job};
use pagecounts::utils::init_logging;

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let inputs = args.resolver().resolve(&args.ymd())?;
    let job = Job {
        inputs,
        workload: "most-visited".to_string(),
        output: args.output(),
        args: Vec::new(),
        n_reduce: args.reducers,
    };

    for kv in standalone::run(&job)? {
        let result = AggregationResult::try_from(kv)?;
        log::info!("most visited: {result}");
    }
    Ok(())
}
