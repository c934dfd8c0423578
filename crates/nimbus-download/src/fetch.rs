//! Resilient listing fetch
//!
//! An authenticated listing GET that classifies an empty result as session
//! expiry, triggers the single-flight refresh, and retries exactly once per
//! refresh. The service returns a bare header row instead of an error page
//! when the session cookie has gone stale, so emptiness is the only signal
//! available.

use std::sync::Arc;

use nimbus_net::{format_cookie, NetError, Transport};
use nimbus_session::SessionManager;
use nimbus_table::{TableExtractor, TableRow};

use crate::error::FetchError;

pub struct TableFetcher {
    transport: Arc<dyn Transport>,
    session: SessionManager,
    extractor: TableExtractor,
    /// Treat an empty first table as an expired session. On by default; can
    /// be disabled when a listing is legitimately expected to be empty.
    empty_means_expired: bool,
}

impl TableFetcher {
    pub fn new(transport: Arc<dyn Transport>, session: SessionManager) -> Self {
        Self {
            transport,
            session,
            extractor: TableExtractor::new(),
            empty_means_expired: true,
        }
    }

    pub fn with_empty_means_expired(mut self, enabled: bool) -> Self {
        self.empty_means_expired = enabled;
        self
    }

    /// Fetch the first table at `url`, header row dropped.
    pub async fn fetch_table(&self, url: &str) -> Result<Vec<TableRow>, FetchError> {
        let token = self.session.token().await?;

        match self.fetch_rows(url, &token).await? {
            None => return Err(FetchError::NoTable(url.to_string())),
            Some(rows) if !rows.is_empty() => return Ok(rows),
            Some(_) if !self.empty_means_expired => return Ok(Vec::new()),
            Some(_) => {}
        }

        tracing::debug!(url, "Empty listing; treating session as expired");
        let token = self.session.invalidate_and_refresh(&token).await?;

        match self.fetch_rows(url, &token).await? {
            None => Err(FetchError::NoTable(url.to_string())),
            Some(rows) if rows.is_empty() => Err(FetchError::EmptyAfterRefresh(url.to_string())),
            Some(rows) => Ok(rows),
        }
    }

    /// One authenticated GET; `None` when the document has no table at all.
    async fn fetch_rows(&self, url: &str, token: &str) -> Result<Option<Vec<TableRow>>, FetchError> {
        let cookie = format_cookie(self.session.cookie_name(), token);
        let response = self.transport.get(url, Some(&cookie)).await?;
        if !response.is_success() {
            return Err(NetError::Status(response.status).into());
        }

        let mut tables = self.extractor.parse(&response.text());
        if tables.is_empty() {
            return Ok(None);
        }

        let mut rows = tables.swap_remove(0);
        if !rows.is_empty() {
            rows.remove(0); // header row
        }
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::FakeRemote;
    use std::sync::atomic::Ordering;

    const LISTING: &str = "https://remote.example/listing";

    #[tokio::test]
    async fn test_fetch_drops_header_row() {
        let remote = FakeRemote::new("token-1");
        remote.serve_page(
            LISTING,
            r#"<table>
                <tr><th>Name</th></tr>
                <tr><td>Game A</td></tr>
            </table>"#,
        );

        let fetcher = remote.fetcher_with_seeded_token("token-1");
        let rows = fetcher.fetch_table(LISTING).await.unwrap();
        assert_eq!(rows, vec![vec!["Game A".to_string()]]);
    }

    #[tokio::test]
    async fn test_no_table_is_fatal() {
        let remote = FakeRemote::new("token-1");
        remote.serve_page(LISTING, "<html><body>maintenance</body></html>");

        let fetcher = remote.fetcher_with_seeded_token("token-1");
        let err = fetcher.fetch_table(LISTING).await.unwrap_err();
        assert!(matches!(err, FetchError::NoTable(_)));
    }

    #[tokio::test]
    async fn test_empty_listing_triggers_refresh_then_succeeds() {
        let remote = FakeRemote::new("fresh-token");
        // Header-only table first (stale session), populated table after
        remote.serve_page(LISTING, "<table><tr><th>Name</th></tr></table>");
        remote.serve_page(
            LISTING,
            r#"<table>
                <tr><th>Name</th></tr>
                <tr><td>Game A</td></tr>
            </table>"#,
        );

        let fetcher = remote.fetcher_with_seeded_token("stale-token");
        let rows = fetcher.fetch_table(LISTING).await.unwrap();

        assert_eq!(rows, vec![vec!["Game A".to_string()]]);
        assert_eq!(remote.transport.handshakes.load(Ordering::SeqCst), 1);

        // The retried GET carried the refreshed token
        let gets = remote.transport.gets.lock();
        assert_eq!(gets.len(), 2);
        assert_eq!(gets[0].1.as_deref(), Some("steamLoginSecure=stale-token"));
        assert_eq!(gets[1].1.as_deref(), Some("steamLoginSecure=fresh-token"));
    }

    #[tokio::test]
    async fn test_persistently_empty_is_fatal_not_a_loop() {
        let remote = FakeRemote::new("fresh-token");
        remote.serve_page(LISTING, "<table><tr><th>Name</th></tr></table>");
        remote.serve_page(LISTING, "<table><tr><th>Name</th></tr></table>");

        let fetcher = remote.fetcher_with_seeded_token("stale-token");
        let err = fetcher.fetch_table(LISTING).await.unwrap_err();

        assert!(matches!(err, FetchError::EmptyAfterRefresh(_)));
        // Exactly one refresh, exactly two GETs
        assert_eq!(remote.transport.handshakes.load(Ordering::SeqCst), 1);
        assert_eq!(remote.transport.gets.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_allowed_when_configured() {
        let remote = FakeRemote::new("fresh-token");
        remote.serve_page(LISTING, "<table><tr><th>Name</th></tr></table>");

        let fetcher = remote
            .fetcher_with_seeded_token("token-1")
            .with_empty_means_expired(false);
        let rows = fetcher.fetch_table(LISTING).await.unwrap();

        assert!(rows.is_empty());
        assert_eq!(remote.transport.handshakes.load(Ordering::SeqCst), 0);
    }
}
