//! Fetch and download error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No table found in document at {0}")]
    NoTable(String),

    #[error("Listing at {0} still empty after session refresh")]
    EmptyAfterRefresh(String),

    #[error("Session error: {0}")]
    Session(#[from] nimbus_session::SessionError),

    #[error("Network error: {0}")]
    Net(#[from] nimbus_net::NetError),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Session error: {0}")]
    Session(#[from] nimbus_session::SessionError),

    #[error("Network error: {0}")]
    Net(#[from] nimbus_net::NetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download task cancelled")]
    Cancelled,
}
