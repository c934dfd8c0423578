//! Download orchestrator
//!
//! Entries are processed sequentially: entry N's listing fetch
//! happens-before its downloads, which happen-before entry N+1's fetch.
//! Within an entry, per-file downloads fan out under a semaphore bound.
//! Item failures are accumulated, never fatal; an authentication failure
//! aborts the whole run.

use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use nimbus_net::{format_cookie, NetError, Transport};
use nimbus_session::SessionManager;

use crate::error::{DownloadError, FetchError};
use crate::fetch::TableFetcher;
use crate::items::{DownloadItem, RemoteEntry};
use crate::Result;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub entries_processed: usize,
    pub files_downloaded: usize,
    /// Human-readable per-item and per-entry failures
    pub failures: Vec<String>,
}

pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    session: SessionManager,
    fetcher: TableFetcher,
    listing_url: String,
    results_root: PathBuf,
    concurrency: usize,
    shutdown: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionManager,
        listing_url: String,
        results_root: PathBuf,
    ) -> Self {
        let fetcher = TableFetcher::new(Arc::clone(&transport), session.clone());

        Self {
            transport,
            session,
            fetcher,
            listing_url,
            results_root,
            concurrency: DEFAULT_CONCURRENCY,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Flag checked before launching new work; in-flight downloads are
    /// always awaited.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Walk the top-level listing and download every listed file of every
    /// whitelisted entry. An empty whitelist processes everything.
    pub async fn run(&self, whitelist: &HashSet<String>) -> Result<RunSummary> {
        let run_dir = self
            .results_root
            .join(Local::now().format("%y%m%d").to_string());
        tokio::fs::create_dir_all(&run_dir).await?;

        let rows = self.fetcher.fetch_table(&self.listing_url).await?;
        let entries: Vec<RemoteEntry> = rows
            .iter()
            .filter_map(|row| RemoteEntry::from_row(row))
            .filter(|entry| whitelist.is_empty() || whitelist.contains(&entry.display_name))
            .collect();

        tracing::info!(total = entries.len(), "Resolved entries to process");

        let mut summary = RunSummary::default();
        for entry in entries {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!("Shutdown requested; stopping before next entry");
                break;
            }

            match self.process_entry(&entry, &run_dir, &mut summary).await {
                Ok(downloaded) => {
                    summary.entries_processed += 1;
                    summary.files_downloaded += downloaded;
                    tracing::info!(
                        entry = %entry.display_name,
                        files = downloaded,
                        "Downloaded files for entry"
                    );
                }
                // Authentication failures abort the run; anything else
                // skips this entry only
                Err(DownloadError::Fetch(FetchError::Session(e))) => {
                    return Err(FetchError::Session(e).into());
                }
                Err(e @ DownloadError::Session(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        entry = %entry.display_name,
                        error = %e,
                        "Skipping entry after listing failure"
                    );
                    summary.failures.push(format!("{}: {}", entry.display_name, e));
                }
            }
        }

        Ok(summary)
    }

    async fn process_entry(
        &self,
        entry: &RemoteEntry,
        run_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<usize> {
        let rows = self.fetcher.fetch_table(&entry.detail_url).await?;
        let items: Vec<DownloadItem> = rows
            .iter()
            .filter_map(|row| DownloadItem::from_row(row))
            .filter(|item| !item.is_placeholder())
            .collect();

        let entry_dir = run_dir.join(entry.directory_name());
        tokio::fs::create_dir_all(&entry_dir).await?;

        let token = self.session.token().await?;
        let cookie = format_cookie(self.session.cookie_name(), &token);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(String, Result<()>)> = JoinSet::new();

        for item in items {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!(
                    entry = %entry.display_name,
                    "Shutdown requested; not launching further downloads"
                );
                break;
            }

            let transport = Arc::clone(&self.transport);
            let semaphore = Arc::clone(&semaphore);
            let cookie = cookie.clone();
            let destination = entry_dir.join(item.target_file_name());
            let file_name = item.target_file_name();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (file_name, Err(DownloadError::Cancelled));
                };
                let result =
                    download_item(transport.as_ref(), &cookie, &item.source_url, &destination)
                        .await;
                (file_name, result)
            });
        }

        let mut downloaded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => downloaded += 1,
                Ok((file_name, Err(e))) => {
                    tracing::warn!(
                        entry = %entry.display_name,
                        file = %file_name,
                        error = %e,
                        "Download failed"
                    );
                    summary
                        .failures
                        .push(format!("{}/{}: {}", entry.display_name, file_name, e));
                }
                Err(e) => {
                    tracing::warn!(entry = %entry.display_name, error = %e, "Download task aborted");
                    summary
                        .failures
                        .push(format!("{}: task aborted: {}", entry.display_name, e));
                }
            }
        }

        Ok(downloaded)
    }
}

/// Fetch one file and write it to `destination`, overwriting any existing
/// file. The session cookie rides along; pre-signed direct links simply
/// ignore it.
async fn download_item(
    transport: &dyn Transport,
    cookie: &str,
    source_url: &str,
    destination: &Path,
) -> Result<()> {
    let response = transport.get(source_url, Some(cookie)).await?;
    if !response.is_success() {
        return Err(NetError::Status(response.status).into());
    }

    tokio::fs::write(destination, &response.body).await?;
    tracing::debug!(file = %destination.display(), bytes = response.body.len(), "Wrote file");

    Ok(())
}
