//! Credential surface consumed by the login handshake

/// Account credentials, read once at startup and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

/// Source of the one-time second-factor code.
///
/// The handshake never touches the console directly; the binary installs a
/// terminal-backed prompt and tests install fixtures.
pub trait CredentialPrompt: Send + Sync {
    fn one_time_code(&self) -> std::io::Result<String>;
}
