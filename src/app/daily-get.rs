use anyhow::Result;
use clap::Parser;
use pagecounts::acquire::{self, loader::HiveCli, loader::LocalTable};
use pagecounts::cmd::acquire::Args;
use pagecounts::utils::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let (config, request) = (args.config(), args.request());
    let loaded = match &args.local_table {
        Some(root) => acquire::run(&config, request, LocalTable::new(root)).await?,
        None => {
            let hive = HiveCli::new(&args.hive_bin, &args.table);
            acquire::run(&config, request, hive).await?
        }
    };

    log::info!("Job ended. {loaded} snapshots loaded.");
    Ok(())
}
