//! Session error types
//!
//! Everything here is fatal for the run: the handshake has no documented
//! retry beyond the single second-factor attempt.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network error during login: {0}")]
    Net(#[from] nimbus_net::NetError),

    #[error("Malformed challenge response from the key-exchange endpoint")]
    MalformedChallenge,

    #[error("Malformed response from the login endpoint")]
    MalformedLogin,

    #[error("Credential encryption failed: {0}")]
    Encrypt(#[from] rsa::Error),

    #[error("Two-factor code rejected by the login endpoint")]
    TwoFactorFailed,

    #[error("Login accepted but transfer parameters were missing")]
    MissingTransferParameters,

    #[error("Transfer response carried no session cookie")]
    MissingTransferCookie,

    #[error("Second-factor prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("No credentials configured")]
    MissingCredentials,

    #[error("A concurrent login handshake failed")]
    RefreshFailed,
}
