//! Nimbus session management
//!
//! Owns the session token and the challenge-response login handshake that
//! produces it. The core guarantees:
//! - `token()` never blocks while the session is valid
//! - N concurrent stale-token reports collapse into exactly one handshake
//! - a failed handshake never leaves the session in a valid state

mod error;
mod handshake;
mod manager;

pub use error::SessionError;
pub use handshake::Endpoints;
pub use manager::{SessionManager, SessionState};

pub type Result<T> = std::result::Result<T, SessionError>;
