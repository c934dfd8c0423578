//! Nimbus binary
//!
//! Loads the config file, wires the transport, session manager and
//! orchestrator together, and runs one download pass over the remote
//! storage listing.

use anyhow::Result;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use nimbus_core::{init_logging, ConfigStore};
use nimbus_download::{Orchestrator, DEFAULT_CONCURRENCY};
use nimbus_net::{HttpTransport, Transport};
use nimbus_session::SessionManager;

mod prompt;

use prompt::TerminalPrompt;

const DEFAULT_LISTING_URL: &str = "https://store.steampowered.com/account/remotestorage";

#[derive(Parser, Debug)]
#[command(name = "nimbus", version, about = "Download remote storage saves")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Root directory for downloaded files; defaults to Results/ beside the
    /// config file
    #[arg(long)]
    results: Option<PathBuf>,

    /// Maximum parallel downloads within one entry
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Top-level listing URL
    #[arg(long, default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Process only these entry names, overriding the config whitelist
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let store = Arc::new(ConfigStore::load(&cli.config)?);
    let config = store.config();

    let results_root = cli.results.unwrap_or_else(|| {
        cli.config
            .parent()
            .map(|dir| dir.join("Results"))
            .unwrap_or_else(|| PathBuf::from("Results"))
    });

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(Duration::from_secs(cli.timeout))?);

    let session = SessionManager::new(
        Arc::clone(&transport),
        config.credentials(),
        Arc::new(TerminalPrompt),
    )
    .with_seeded_token(config.session_token.clone())
    .with_token_store(store);

    let orchestrator = Orchestrator::new(transport, session, cli.listing_url, results_root)
        .with_concurrency(cli.concurrency);

    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; finishing in-flight downloads");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    let whitelist: HashSet<String> = if cli.only.is_empty() {
        config.whitelist()
    } else {
        cli.only.into_iter().collect()
    };

    let summary = orchestrator.run(&whitelist).await?;

    for failure in &summary.failures {
        tracing::warn!(%failure, "Download failure");
    }
    tracing::info!(
        entries = summary.entries_processed,
        files = summary.files_downloaded,
        failures = summary.failures.len(),
        "Run complete"
    );

    Ok(())
}
