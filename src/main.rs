use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cf_warp::account::FileStore;
use cf_warp::cli::Cli;
use cf_warp::client::WarpClient;
use cf_warp::config::WarpConfig;
use cf_warp::events::TracingSink;
use cf_warp::quota::TokioSleeper;
use cf_warp::{Orchestrator, RunReport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dir = cli.storage_dir()?;
    let config = WarpConfig::load_or_default(&dir)?;

    let level = if cli.verbose { "debug" } else { config.log.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let store = Arc::new(FileStore::new(&dir));
    let client = Arc::new(WarpClient::new(&config.api)?);
    let orchestrator = Orchestrator::new(
        client,
        store.clone(),
        Arc::new(TokioSleeper),
        Arc::new(TracingSink),
        config.referral.clone(),
    );

    let report = orchestrator.run(cli.referral_count()).await?;
    print_summary(&store, &report);
    Ok(())
}

fn print_summary(store: &FileStore, report: &RunReport) {
    println!(
        "Your Warp credentials are located at \"{}\",\nand WireGuard connection file is \"{}\".\n",
        store.data_path().display(),
        store.config_path().display()
    );
    println!(
        "You currently have {}GB Warp+ quota.\n",
        report.state.credential.account.quota_gb()
    );
    println!("For more information run `cf-warp --help`.");
}
