//! Challenge-response login handshake
//!
//! Five network rounds, no filesystem access, terminal states success or
//! fatal. The handshake is not idempotent server-side; running it must be
//! guarded by the manager's single-flight lock.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};
use serde::Deserialize;

use nimbus_core::{CredentialPrompt, Credentials};
use nimbus_net::{extract_cookie, HttpResponse, Transport};

use crate::error::SessionError;
use crate::Result;

/// Endpoint set the handshake talks to, plus the cookie that carries the
/// resulting token.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub rsa_key_url: String,
    pub login_url: String,
    pub transfer_url: String,
    pub cookie_name: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rsa_key_url: "https://store.steampowered.com/login/getrsakey/".to_string(),
            login_url: "https://store.steampowered.com/login/dologin/".to_string(),
            transfer_url: "https://store.steampowered.com/login/transfer".to_string(),
            cookie_name: "steamLoginSecure".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RsaChallenge {
    publickey_mod: Option<String>,
    publickey_exp: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    transfer_parameters: Option<TransferParameters>,
}

#[derive(Debug, Deserialize)]
struct TransferParameters {
    steamid: String,
    token_secure: String,
    auth: String,
}

pub(crate) struct Handshake<'a> {
    transport: &'a dyn Transport,
    prompt: &'a dyn CredentialPrompt,
    endpoints: &'a Endpoints,
    credentials: &'a Credentials,
}

impl<'a> Handshake<'a> {
    pub(crate) fn new(
        transport: &'a dyn Transport,
        prompt: &'a dyn CredentialPrompt,
        endpoints: &'a Endpoints,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            transport,
            prompt,
            endpoints,
            credentials,
        }
    }

    /// Run the full handshake and return the new session token.
    pub(crate) async fn run(&self) -> Result<String> {
        if self.credentials.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let (modulus, exponent, timestamp) = self.request_challenge().await?;
        let encrypted = encrypt_password(&modulus, &exponent, &self.credentials.password)?;

        let mut login = self.submit_login(&encrypted, &timestamp, None).await?;
        if !login.success {
            tracing::info!("Login requires a second factor");
            let code = self.prompt.one_time_code()?;
            login = self.submit_login(&encrypted, &timestamp, Some(&code)).await?;
            if !login.success {
                return Err(SessionError::TwoFactorFailed);
            }
        }

        let transfer = login
            .transfer_parameters
            .ok_or(SessionError::MissingTransferParameters)?;

        self.transfer(&transfer).await
    }

    async fn request_challenge(&self) -> Result<(String, String, String)> {
        let response = self
            .transport
            .post_form(
                &self.endpoints.rsa_key_url,
                &[("username", self.credentials.username.clone())],
            )
            .await?;
        expect_success(&response)?;

        let challenge: RsaChallenge = serde_json::from_slice(&response.body)
            .map_err(|_| SessionError::MalformedChallenge)?;

        match (
            challenge.publickey_mod,
            challenge.publickey_exp,
            challenge.timestamp,
        ) {
            (Some(modulus), Some(exponent), Some(timestamp))
                if !modulus.is_empty() && !exponent.is_empty() =>
            {
                Ok((modulus, exponent, timestamp))
            }
            _ => Err(SessionError::MalformedChallenge),
        }
    }

    async fn submit_login(
        &self,
        encrypted_password: &str,
        timestamp: &str,
        two_factor_code: Option<&str>,
    ) -> Result<LoginResponse> {
        let mut fields = vec![
            ("username", self.credentials.username.clone()),
            ("password", encrypted_password.to_string()),
            ("rsatimestamp", timestamp.to_string()),
        ];
        if let Some(code) = two_factor_code {
            fields.push(("twofactorcode", code.to_string()));
            fields.push(("remember_login", "true".to_string()));
        }

        let response = self
            .transport
            .post_form(&self.endpoints.login_url, &fields)
            .await?;
        expect_success(&response)?;

        serde_json::from_slice(&response.body).map_err(|_| SessionError::MalformedLogin)
    }

    async fn transfer(&self, transfer: &TransferParameters) -> Result<String> {
        let response = self
            .transport
            .post_form(
                &self.endpoints.transfer_url,
                &[
                    ("steamid", transfer.steamid.clone()),
                    ("token_secure", transfer.token_secure.clone()),
                    ("auth", transfer.auth.clone()),
                ],
            )
            .await?;
        expect_success(&response)?;

        response
            .set_cookie
            .iter()
            .find_map(|header| extract_cookie(header, &self.endpoints.cookie_name))
            .ok_or(SessionError::MissingTransferCookie)
    }
}

fn expect_success(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(nimbus_net::NetError::Status(response.status).into())
    }
}

/// PKCS#1 v1.5-encrypt the password under the challenge key and
/// base64-encode the ciphertext. The form layer percent-encodes it for
/// transport.
pub(crate) fn encrypt_password(
    modulus_hex: &str,
    exponent_hex: &str,
    password: &str,
) -> Result<String> {
    let modulus = BigUint::parse_bytes(modulus_hex.as_bytes(), 16)
        .ok_or(SessionError::MalformedChallenge)?;
    let exponent = BigUint::parse_bytes(exponent_hex.as_bytes(), 16)
        .ok_or(SessionError::MalformedChallenge)?;

    let key = RsaPublicKey::new(modulus, exponent)?;
    let ciphertext = key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, password.as_bytes())?;

    Ok(BASE64.encode(ciphertext))
}
