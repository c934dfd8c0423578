//! Session lifecycle and single-flight refresh
//!
//! The token is the only state shared across concurrent tasks. Reads are
//! cheap once the session is valid; a stale-token report takes the async
//! refresh lock, re-compares its observed token against the current one,
//! and only the first reporter actually runs the handshake.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

use nimbus_core::{CredentialPrompt, Credentials, TokenStore};
use nimbus_net::Transport;

use crate::error::SessionError;
use crate::handshake::{Endpoints, Handshake};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Valid,
    Refreshing,
}

struct SessionCell {
    token: String,
    state: SessionState,
    /// Bumped after every completed handshake attempt, success or failure.
    /// Lets waiters tell "a refresh ran while I waited" from "nothing
    /// happened yet".
    epoch: u64,
}

pub struct SessionManager {
    cell: Arc<RwLock<SessionCell>>,
    refresh_lock: Arc<Mutex<()>>,
    transport: Arc<dyn Transport>,
    prompt: Arc<dyn CredentialPrompt>,
    credentials: Credentials,
    endpoints: Endpoints,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self {
        Self {
            cell: Arc::new(RwLock::new(SessionCell {
                token: String::new(),
                state: SessionState::Unauthenticated,
                epoch: 0,
            })),
            refresh_lock: Arc::new(Mutex::new(())),
            transport,
            prompt,
            credentials,
            endpoints: Endpoints::default(),
            token_store: None,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Seed a token from the config file; the session starts valid and the
    /// handshake only runs on the first expiry.
    pub fn with_seeded_token(self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut cell = self.cell.write();
            cell.token = token;
            cell.state = SessionState::Valid;
            drop(cell);
        }
        self
    }

    /// Write the refreshed token through to the config store.
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn state(&self) -> SessionState {
        self.cell.read().state
    }

    pub fn cookie_name(&self) -> &str {
        &self.endpoints.cookie_name
    }

    /// Current token. Returns without blocking while the session is valid;
    /// an unauthenticated session logs in on first demand.
    pub async fn token(&self) -> Result<String> {
        let stale = {
            let cell = self.cell.read();
            if cell.state == SessionState::Valid {
                return Ok(cell.token.clone());
            }
            cell.token.clone()
        };

        self.invalidate_and_refresh(&stale).await
    }

    /// Report `stale_token` as expired and get a fresh one.
    ///
    /// If another refresh already replaced the token, the current token is
    /// returned without a new handshake. Otherwise the first caller runs the
    /// handshake while every concurrent reporter waits for its outcome.
    pub async fn invalidate_and_refresh(&self, stale_token: &str) -> Result<String> {
        let observed_epoch = {
            let cell = self.cell.read();
            if cell.state == SessionState::Valid && cell.token != stale_token {
                return Ok(cell.token.clone());
            }
            cell.epoch
        };

        let _guard = self.refresh_lock.lock().await;

        // Re-check under the lock: a handshake may have completed while we
        // waited, and its outcome is ours too.
        {
            let cell = self.cell.read();
            if cell.epoch != observed_epoch {
                return if cell.state == SessionState::Valid {
                    Ok(cell.token.clone())
                } else {
                    Err(SessionError::RefreshFailed)
                };
            }
        }

        self.cell.write().state = SessionState::Refreshing;
        tracing::info!("Session token stale; running login handshake");

        let handshake = Handshake::new(
            self.transport.as_ref(),
            self.prompt.as_ref(),
            &self.endpoints,
            &self.credentials,
        );

        match handshake.run().await {
            Ok(token) => {
                {
                    let mut cell = self.cell.write();
                    cell.token = token.clone();
                    cell.state = SessionState::Valid;
                    cell.epoch += 1;
                }
                if let Some(store) = &self.token_store {
                    if let Err(e) = store.persist_token(&token) {
                        tracing::warn!(error = %e, "Failed to persist refreshed session token");
                    }
                }
                tracing::info!("Login handshake completed");
                Ok(token)
            }
            Err(e) => {
                // Never leave partial session state valid
                let mut cell = self.cell.write();
                cell.token.clear();
                cell.state = SessionState::Unauthenticated;
                cell.epoch += 1;
                drop(cell);
                tracing::error!(error = %e, "Login handshake failed");
                Err(e)
            }
        }
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            refresh_lock: Arc::clone(&self.refresh_lock),
            transport: Arc::clone(&self.transport),
            prompt: Arc::clone(&self.prompt),
            credentials: self.credentials.clone(),
            endpoints: self.endpoints.clone(),
            token_store: self.token_store.clone(),
        }
    }
}
