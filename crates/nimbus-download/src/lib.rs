//! Nimbus download orchestration
//!
//! Walks the top-level listing of remote entries, fetches each entry's file
//! table through the session-aware resilient fetch, and fans out bounded
//! concurrent downloads of every listed file.

mod error;
mod fetch;
mod items;
mod orchestrator;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{DownloadError, FetchError};
pub use fetch::TableFetcher;
pub use items::{DownloadItem, RemoteEntry};
pub use orchestrator::{Orchestrator, RunSummary, DEFAULT_CONCURRENCY};

pub type Result<T> = std::result::Result<T, DownloadError>;
