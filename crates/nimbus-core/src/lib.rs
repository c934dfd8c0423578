//! Nimbus Core
//!
//! Configuration file handling and the credential surface shared by the
//! login handshake. The config file is the only thing Nimbus persists:
//! credentials, an optional seeded session token, and the entry whitelist.

mod config;
mod credentials;
mod error;

pub use config::{Config, ConfigStore, TokenStore};
pub use credentials::{CredentialPrompt, Credentials};
pub use error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
