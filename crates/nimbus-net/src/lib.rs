//! Nimbus HTTP transport
//!
//! The only network I/O primitive in the workspace. Everything above this
//! crate talks to the remote service through the [`Transport`] trait, which
//! keeps the login handshake and the download orchestrator testable against
//! scripted responses.

mod cookie;
mod error;
mod transport;

pub use cookie::{extract_cookie, format_cookie};
pub use error::NetError;
pub use transport::{HttpResponse, HttpTransport, Transport, BROWSER_USER_AGENT};

pub type Result<T> = std::result::Result<T, NetError>;
