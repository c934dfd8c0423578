//! Shared test fixtures: a scripted remote service
//!
//! Serves successive HTML bodies per listing URL, raw bytes per file URL,
//! and a complete login backend (real RSA challenge, fixed token) so expiry
//! scenarios can run the genuine handshake path.

use async_trait::async_trait;
use parking_lot::Mutex;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nimbus_core::{CredentialPrompt, Credentials};
use nimbus_net::{HttpResponse, Transport};
use nimbus_session::SessionManager;

use crate::fetch::TableFetcher;
use crate::orchestrator::Orchestrator;

struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn one_time_code(&self) -> std::io::Result<String> {
        Err(std::io::Error::other("no prompt in tests"))
    }
}

pub(crate) struct FakeTransport {
    key: RsaPrivateKey,
    token: String,
    pages: Mutex<HashMap<String, VecDeque<String>>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    reject_logins: AtomicBool,
    /// Number of key-exchange requests, i.e. observed login sequences
    pub handshakes: AtomicUsize,
    /// Every GET with the cookie header it carried
    pub gets: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeTransport {
    fn new(token: &str) -> Self {
        Self {
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap(),
            token: token.to_string(),
            pages: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            reject_logins: AtomicBool::new(false),
            handshakes: AtomicUsize::new(0),
            gets: Mutex::new(Vec::new()),
        }
    }

    fn ok(body: Vec<u8>) -> HttpResponse {
        HttpResponse {
            status: 200,
            body,
            set_cookie: Vec::new(),
        }
    }

    fn not_found() -> HttpResponse {
        HttpResponse {
            status: 404,
            body: Vec::new(),
            set_cookie: Vec::new(),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, cookie: Option<&str>) -> nimbus_net::Result<HttpResponse> {
        self.gets
            .lock()
            .push((url.to_string(), cookie.map(String::from)));

        if let Some(bytes) = self.files.lock().get(url) {
            return Ok(Self::ok(bytes.clone()));
        }
        if let Some(queue) = self.pages.lock().get_mut(url) {
            if let Some(body) = queue.pop_front() {
                return Ok(Self::ok(body.into_bytes()));
            }
        }

        Ok(Self::not_found())
    }

    async fn post_form(
        &self,
        url: &str,
        _fields: &[(&str, String)],
    ) -> nimbus_net::Result<HttpResponse> {
        if url.contains("getrsakey") {
            self.handshakes.fetch_add(1, Ordering::SeqCst);
            let body = format!(
                r#"{{"publickey_mod": "{:x}", "publickey_exp": "{:x}", "timestamp": "98765"}}"#,
                self.key.n(),
                self.key.e()
            );
            return Ok(Self::ok(body.into_bytes()));
        }

        if url.contains("dologin") {
            if self.reject_logins.load(Ordering::SeqCst) {
                return Ok(Self::ok(br#"{"success": false}"#.to_vec()));
            }
            return Ok(Self::ok(
                br#"{"success": true, "transfer_parameters":
                    {"steamid": "7656", "token_secure": "ts", "auth": "au"}}"#
                    .to_vec(),
            ));
        }

        if url.contains("transfer") {
            return Ok(HttpResponse {
                status: 200,
                body: Vec::new(),
                set_cookie: vec![format!(
                    "steamLoginSecure={}; Path=/; Secure; HttpOnly",
                    self.token
                )],
            });
        }

        Ok(Self::not_found())
    }
}

/// Scripted remote plus convenience constructors for the units under test.
pub(crate) struct FakeRemote {
    pub transport: Arc<FakeTransport>,
}

impl FakeRemote {
    /// `token` is what the login backend hands out after a handshake.
    pub fn new(token: &str) -> Self {
        Self {
            transport: Arc::new(FakeTransport::new(token)),
        }
    }

    /// Every subsequent login attempt is rejected; with no prompt
    /// available, any triggered handshake fails.
    pub fn reject_logins(&self) {
        self.transport.reject_logins.store(true, Ordering::SeqCst);
    }

    /// Queue an HTML body for `url`; successive GETs consume them in order.
    pub fn serve_page(&self, url: &str, html: &str) {
        self.transport
            .pages
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(html.to_string());
    }

    pub fn serve_file(&self, url: &str, bytes: &[u8]) {
        self.transport
            .files
            .lock()
            .insert(url.to_string(), bytes.to_vec());
    }

    fn session(&self, seeded_token: &str) -> SessionManager {
        let transport: Arc<dyn Transport> = self.transport.clone();
        SessionManager::new(
            transport,
            Credentials {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            },
            Arc::new(NoPrompt),
        )
        .with_seeded_token(Some(seeded_token.to_string()))
    }

    pub fn fetcher_with_seeded_token(&self, token: &str) -> TableFetcher {
        let transport: Arc<dyn Transport> = self.transport.clone();
        TableFetcher::new(transport, self.session(token))
    }

    pub fn orchestrator_with_seeded_token(
        &self,
        token: &str,
        listing_url: &str,
        results_root: PathBuf,
    ) -> Orchestrator {
        let transport: Arc<dyn Transport> = self.transport.clone();
        Orchestrator::new(
            transport,
            self.session(token),
            listing_url.to_string(),
            results_root,
        )
    }
}
