//! Ticketing portal HTTP client.
//!
//! Two calls make up one availability query: a GET of the index page for a
//! fresh anti-forgery token, then a form POST to the search endpoint. The
//! client keeps a cookie store so the session cookie issued alongside the
//! token accompanies the search.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use tracing::debug;

use crate::domain::SearchQuery;

use super::error::PortalError;
use super::token::{CsrfToken, extract_token};

/// Default base URL for the portal.
pub const DEFAULT_BASE_URL: &str = "https://metickets.krc.co.ke";

/// Departure time sent when a query has none.
pub const DEFAULT_DEPARTURE_TIME: &str = "10.00";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";

/// Configuration for the portal client.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PortalConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the search form in the order the portal's own page submits it.
///
/// The departure time field really is spelt `depature_time` upstream.
pub fn search_form(query: &SearchQuery, token: &CsrfToken) -> Vec<(&'static str, String)> {
    vec![
        ("csrf_token", token.as_str().to_string()),
        ("schedule_type", query.schedule_type.as_str().to_string()),
        ("terminal_id", query.origin_terminal_id.to_string()),
        ("destination_id", query.destination_terminal_id.to_string()),
        ("travel-date", query.travel_date_str()),
        (
            "depature_time",
            query
                .departure_time
                .clone()
                .unwrap_or_else(|| DEFAULT_DEPARTURE_TIME.to_string()),
        ),
    ]
}

/// Portal client holding one cookie-backed session.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PortalClient {
    /// Create a new portal client with the given configuration.
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a fresh anti-forgery token from the index page.
    ///
    /// Any session cookie set by the response is kept for later requests.
    pub async fn fetch_token(&self) -> Result<CsrfToken, PortalError> {
        let url = format!("{}/index.php", self.base_url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let token = extract_token(&body).ok_or(PortalError::TokenNotFound)?;
        debug!(?token, "csrf token extracted");

        Ok(token)
    }

    /// Submit an availability search and return the raw response body.
    ///
    /// The body is not inspected here; see [`crate::interpret`].
    pub async fn search(
        &self,
        query: &SearchQuery,
        token: &CsrfToken,
    ) -> Result<String, PortalError> {
        let url = format!("{}/search-view-results.php", self.base_url);
        let referer = format!("{}/index.php", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(ORIGIN, self.base_url.as_str())
            .header(REFERER, referer)
            .form(&search_form(query, token))
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::ScheduleType;
    use crate::testing::{FakeServer, RecordedRequest, Reply};

    fn query() -> SearchQuery {
        SearchQuery::new(
            ScheduleType::Express,
            NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
            3,
            2,
        )
    }

    #[test]
    fn config_builder() {
        let config = PortalConfig::new()
            .with_base_url("http://localhost:8080/")
            .with_timeout(5);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        let client = PortalClient::new(PortalConfig::new());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn search_form_fields() {
        let token = CsrfToken::new("tok123");
        let form = search_form(&query().with_departure_time("3.00"), &token);

        let names: Vec<_> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec![
                "csrf_token",
                "schedule_type",
                "terminal_id",
                "destination_id",
                "travel-date",
                "depature_time"
            ]
        );

        assert_eq!(form[0].1, "tok123");
        assert_eq!(form[1].1, "express");
        assert_eq!(form[2].1, "3");
        assert_eq!(form[3].1, "2");
        assert_eq!(form[4].1, "03/01/2026");
        assert_eq!(form[5].1, "3.00");
    }

    #[test]
    fn search_form_default_time() {
        let form = search_form(&query(), &CsrfToken::new("t"));
        assert_eq!(form[5], ("depature_time", DEFAULT_DEPARTURE_TIME.to_string()));
    }

    const INDEX_PAGE: &str = r#"<html><body>
        <form action="search-view-results.php" method="post">
          <input type="hidden" name="csrf_token" value="tok-123">
        </form>
        </body></html>"#;

    /// Portal that issues a session cookie and token, and answers searches
    /// with an empty results container.
    async fn portal() -> FakeServer {
        FakeServer::start(|request: &RecordedRequest| match request.path.as_str() {
            "/index.php" => {
                Reply::ok(INDEX_PAGE).with_header("Set-Cookie", "PHPSESSID=sess42; Path=/")
            }
            "/search-view-results.php" => Reply::ok(r#"<div id="form-tags"></div>"#),
            _ => Reply::status(404, "not found"),
        })
        .await
    }

    fn client_for(server: &FakeServer) -> PortalClient {
        PortalClient::new(
            PortalConfig::new()
                .with_base_url(server.base_url())
                .with_timeout(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn search_reuses_session_cookie_and_token() {
        let server = portal().await;
        let client = client_for(&server);

        let token = client.fetch_token().await.unwrap();
        assert_eq!(token.as_str(), "tok-123");

        let body = client
            .search(&query().with_departure_time("3.00"), &token)
            .await
            .unwrap();
        assert_eq!(body, r#"<div id="form-tags"></div>"#);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");

        let search = &requests[1];
        assert_eq!(search.method, "POST");
        assert_eq!(search.path, "/search-view-results.php");
        assert!(search.header("cookie").unwrap().contains("PHPSESSID=sess42"));
        assert_eq!(search.header("origin"), Some(server.base_url()));
        assert_eq!(
            search.header("referer"),
            Some(format!("{}/index.php", server.base_url()).as_str())
        );
        assert!(search.header("user-agent").unwrap().starts_with("Mozilla/5.0"));
        assert_eq!(
            search.body,
            "csrf_token=tok-123&schedule_type=express&terminal_id=3&destination_id=2\
             &travel-date=03%2F01%2F2026&depature_time=3.00"
        );
    }

    #[tokio::test]
    async fn index_without_token_field() {
        let server = FakeServer::start(|_: &RecordedRequest| {
            Reply::ok("<html><body>maintenance</body></html>")
        })
        .await;

        let err = client_for(&server).fetch_token().await.unwrap_err();
        assert!(matches!(err, PortalError::TokenNotFound));
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn index_error_status() {
        let server =
            FakeServer::start(|_: &RecordedRequest| Reply::status(503, "Service Unavailable")).await;

        let err = client_for(&server).fetch_token().await.unwrap_err();
        match &err {
            PortalError::Status { status, message } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn search_error_status_truncates_body() {
        let long_body = "x".repeat(500);
        let server =
            FakeServer::start(move |_: &RecordedRequest| Reply::status(500, long_body.clone()))
                .await;

        let err = client_for(&server)
            .search(&query(), &CsrfToken::new("t"))
            .await
            .unwrap_err();
        match err {
            PortalError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_portal_is_network_error() {
        let client = PortalClient::new(
            PortalConfig::new().with_base_url("http://127.0.0.1:9").with_timeout(5),
        )
        .unwrap();

        let err = client.fetch_token().await.unwrap_err();
        assert!(matches!(err, PortalError::Network(_)));
    }
}
