//! REST listing source.
//!
//! Talks to the listings API: `GET {base_url}{listings_path}` for the full
//! set and `GET {base_url}{favorites_path}` for the signed-in user's saved
//! listings. Requests carry an optional `Authorization: Bearer` token.

use std::time::Duration;

use apartment_spot_listing_models::Listing;
use async_trait::async_trait;

use crate::{ListingSource, SourceError, retry};

/// Listing source backed by the REST API.
#[derive(Debug, Clone)]
pub struct RestListingSource {
    client: reqwest::Client,
    base_url: String,
    listings_path: String,
    favorites_path: String,
    token: Option<String>,
    max_retries: u32,
}

impl RestListingSource {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// Paths default to `/apartments` and `/favorites`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apartment-spot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            listings_path: "/apartments".to_string(),
            favorites_path: "/favorites".to_string(),
            token: None,
            max_retries: retry::MAX_RETRIES,
        })
    }

    #[must_use]
    pub fn with_listings_path(mut self, path: impl Into<String>) -> Self {
        self.listings_path = path.into();
        self
    }

    #[must_use]
    pub fn with_favorites_path(mut self, path: impl Into<String>) -> Self {
        self.favorites_path = path.into();
        self
    }

    /// Sends `Authorization: Bearer {token}` with every request.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Overrides how often transient failures are retried.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fetches the signed-in user's favorite listings.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the API answers with
    /// an error status, or the body is not a listing array.
    pub async fn fetch_favorites(&self) -> Result<Vec<Listing>, SourceError> {
        self.get_listings(&self.favorites_path).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_listings(&self, path: &str) -> Result<Vec<Listing>, SourceError> {
        let url = self.url(path);
        log::debug!("GET {url}");

        let response = retry::send(
            || {
                let request = self.client.get(&url);
                match &self.token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            },
            self.max_retries,
        )
        .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = error_detail(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            log::warn!("GET {url} failed with {status}: {detail}");
            return Err(SourceError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        parse_listings(&body)
    }
}

#[async_trait]
impl ListingSource for RestListingSource {
    fn name(&self) -> &str {
        "rest"
    }

    async fn fetch_listings(&self) -> Result<Vec<Listing>, SourceError> {
        self.get_listings(&self.listings_path).await
    }
}

/// Parses a listing array. An empty or `null` body is an empty set.
fn parse_listings(body: &str) -> Result<Vec<Listing>, SourceError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let listings: Option<Vec<Listing>> = serde_json::from_str(body)?;
    Ok(listings.unwrap_or_default())
}

/// Extracts a human-readable message from an error response body.
///
/// The API puts errors in a `detail` field that is either a string or a
/// list of `{loc, msg}` validation errors, which are joined as
/// `loc.path: msg; ...`. A JSON body without `detail` is returned as-is.
/// Returns `None` if the body is not JSON.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let Some(detail) = value.get("detail") else {
        return Some(value.to_string());
    };

    match detail {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Array(errors) => Some(
            errors
                .iter()
                .map(|err| {
                    let loc = err["loc"]
                        .as_array()
                        .map(|parts| {
                            parts
                                .iter()
                                .map(|part| match part {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect::<Vec<_>>()
                                .join(".")
                        })
                        .unwrap_or_default();
                    let msg = err["msg"].as_str().unwrap_or_default();
                    format!("{loc}: {msg}")
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn detail_string() {
        let body = json!({ "detail": "Not authenticated" }).to_string();
        assert_eq!(error_detail(&body).as_deref(), Some("Not authenticated"));
    }

    #[test]
    fn detail_validation_errors_are_joined() {
        let body = json!({
            "detail": [
                { "loc": ["body", "price"], "msg": "field required", "type": "missing" },
                { "loc": ["query", "limit", 0], "msg": "not an integer" },
            ]
        })
        .to_string();
        assert_eq!(
            error_detail(&body).as_deref(),
            Some("body.price: field required; query.limit.0: not an integer")
        );
    }

    #[test]
    fn detail_fallbacks() {
        let body = json!({ "error": "boom" }).to_string();
        assert_eq!(error_detail(&body).as_deref(), Some(r#"{"error":"boom"}"#));
        assert_eq!(error_detail("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn empty_body_is_empty_set() {
        assert!(parse_listings("").unwrap().is_empty());
        assert!(parse_listings("null").unwrap().is_empty());
        assert!(matches!(parse_listings("{"), Err(SourceError::Json(_))));
    }

    #[test]
    fn parses_flat_listing_payload() {
        let body = json!([{
            "id": "apt1",
            "title": "Sunny 2-Bedroom in Downtown",
            "address": "123 Main St, San Francisco, CA",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "price": 3200,
            "bedrooms": 2,
            "bathrooms": 2,
            "availability_date": "2024-09-01"
        }, {
            "id": "apt5",
            "title": "Garden Unit",
            "address": "1 Unknown Rd",
            "latitude": null,
            "price": 1800,
            "bedrooms": 1,
            "bathrooms": 1.5
        }])
        .to_string();

        let listings = parse_listings(&body).unwrap();
        assert_eq!(listings.len(), 2);
        assert!(listings[0].position().is_some());
        assert!(listings[1].position().is_none());
    }

    #[test]
    fn malformed_coordinates_do_not_drop_the_snapshot() {
        let body = json!([{
            "id": "apt1",
            "title": "Sunny 2-Bedroom in Downtown",
            "address": "123 Main St, San Francisco, CA",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "price": 3200,
            "bedrooms": 2,
            "bathrooms": 2
        }, {
            "id": "apt2",
            "title": "Cozy Studio near Park",
            "address": "456 Oak Ave, San Francisco, CA",
            "latitude": "37.7",
            "longitude": "oops",
            "price": 1800,
            "bedrooms": 0,
            "bathrooms": 1
        }, {
            "id": "apt3",
            "title": "Spacious Family Home",
            "address": "789 Pine Ln, Berkeley, CA",
            "latitude": "37.8715",
            "longitude": "-122.2730",
            "price": 4500,
            "bedrooms": 3,
            "bathrooms": 2.5
        }])
        .to_string();

        let listings = parse_listings(&body).unwrap();
        let ids: Vec<_> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["apt1", "apt2", "apt3"]);
        assert!(listings[0].position().is_some());
        assert!(listings[1].position().is_none());
        assert!(listings[2].position().is_some());
    }

    /// Serves exactly one canned HTTP response and returns the raw request.
    async fn serve_once(status_line: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn fetch_sends_bearer_token() {
        let body = json!([{
            "id": "apt1",
            "title": "Loft",
            "address": "101 Sky High Rd",
            "price": 4500,
            "bedrooms": 1,
            "bathrooms": 1
        }])
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let source = RestListingSource::new(base_url, Duration::from_secs(5))
            .unwrap()
            .with_token(Some("secret".to_string()));
        let listings = source.fetch_listings().await.unwrap();
        assert_eq!(listings.len(), 1);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /apartments "), "request: {request}");
        assert!(request.contains("authorization: bearer secret"), "request: {request}");
    }

    #[tokio::test]
    async fn client_error_carries_detail() {
        let body = json!({ "detail": "Not authenticated" }).to_string();
        let (base_url, server) = serve_once("401 Unauthorized", body).await;

        let source = RestListingSource::new(base_url, Duration::from_secs(5)).unwrap();
        let err = source.fetch_favorites().await.unwrap_err();
        match err {
            SourceError::Api { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Not authenticated");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /favorites "));
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn non_json_error_falls_back_to_status_text() {
        let (base_url, _server) = serve_once("404 Not Found", "nope".to_string()).await;

        let source = RestListingSource::new(base_url, Duration::from_secs(5)).unwrap();
        let err = source.fetch_listings().await.unwrap_err();
        assert!(
            matches!(&err, SourceError::Api { status: 404, detail } if detail == "Not Found"),
            "unexpected error: {err:?}"
        );
    }
}
