//! Transport trait and the reqwest-backed implementation

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

use crate::Result;

/// The remote service rejects requests without a realistic browser
/// user-agent, so every outbound request carries one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// All `Set-Cookie` header values, in response order
    pub set_cookie: Vec<String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP request primitive used by everything above it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET with an optional `Cookie` header value
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<HttpResponse>;

    /// POST a url-encoded form body
    async fn post_form(&self, url: &str, fields: &[(&str, String)]) -> Result<HttpResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(5))
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    async fn convert(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(String::from))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            body,
            set_cookie,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        Self::convert(request.send().await?).await
    }

    async fn post_form(&self, url: &str, fields: &[(&str, String)]) -> Result<HttpResponse> {
        let response = self.client.post(url).form(fields).send().await?;
        Self::convert(response).await
    }
}
