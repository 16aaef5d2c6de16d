//! TAXII 2.1 client.
//!
//! Authenticated access to one collection-sharing server: discovery,
//! readable-collection enumeration, and single-page object retrieval.
//! No retry or backoff policy is applied; each request is issued once.

use crate::wire::{Collection, CollectionsResponse, DiscoveryResponse, Envelope};
use async_trait::async_trait;
use intelsync_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

const TAXII_MEDIA_TYPE: &str = "application/taxii+json;version=2.1";
const DEFAULT_PAGE_SIZE: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one TAXII server.
#[derive(Debug, Clone)]
pub struct TaxiiConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// Objects requested per page.
    pub page_size: u32,
}

impl TaxiiConfig {
    #[tracing::instrument(level = "debug", skip(password))]
    pub fn new(
        server_url: impl Into<String> + std::fmt::Debug,
        username: impl Into<String> + std::fmt::Debug,
        password: impl Into<String>,
    ) -> Result<Self> {
        let server_url = server_url.into();
        if server_url.trim().is_empty() {
            return Err(Error::InvalidInput("taxii server_url is empty".to_string()));
        }
        let username = username.into();
        if username.trim().is_empty() {
            return Err(Error::InvalidInput("taxii username is empty".to_string()));
        }
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            username,
            password: password.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidInput("page_size must be > 0".to_string()));
        }
        self.page_size = page_size;
        Ok(self)
    }
}

/// Transport seam: one authenticated GET returning parsed JSON.
#[async_trait]
pub trait TaxiiTransport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value>;
}

/// Production transport over `reqwest` with HTTP basic auth.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &TaxiiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        // API roots may be advertised as absolute URLs.
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl TaxiiTransport for HttpTransport {
    #[tracing::instrument(level = "debug", skip(self, query))]
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value> {
        tracing::info!(url_path = %path, "GET request to endpoint");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(TAXII_MEDIA_TYPE));

        let resp = self
            .client
            .get(self.url(path))
            .headers(headers)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await
            .map_err(Error::transport_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::TransportMessage(if body.is_empty() {
                format!("GET {path} failed: {status}")
            } else {
                format!("GET {path} failed: {status}: {body}")
            }));
        }

        resp.json().await.map_err(Error::transport_reqwest)
    }
}

/// Client for one TAXII 2.1 server.
///
/// The first advertised API root is resolved once and cached; all collection
/// and object requests go through it.
pub struct TaxiiClient {
    transport: Arc<dyn TaxiiTransport>,
    page_size: u32,
    api_root: OnceCell<String>,
}

impl TaxiiClient {
    pub fn new(config: TaxiiConfig) -> Self {
        let page_size = config.page_size;
        Self {
            transport: Arc::new(HttpTransport::new(&config)),
            page_size,
            api_root: OnceCell::new(),
        }
    }

    /// Build a client over a custom transport (tests, alternate stacks).
    pub fn with_transport(transport: Arc<dyn TaxiiTransport>, page_size: u32) -> Self {
        Self {
            transport,
            page_size,
            api_root: OnceCell::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `GET /taxii2/` and return the first advertised API root.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn discover(&self) -> Result<String> {
        let value = self.transport.get_json("/taxii2/", &[]).await?;
        let discovery: DiscoveryResponse =
            serde_json::from_value(value).map_err(|e| Error::parse("discovery response", e))?;
        discovery
            .api_roots
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("server advertises no API roots".to_string()))
    }

    async fn api_root(&self) -> Result<&str> {
        self.api_root
            .get_or_try_init(|| self.discover())
            .await
            .map(|root| root.as_str())
    }

    /// Enumerate collections under the first API root, keeping readable ones.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn readable_collections(&self) -> Result<Vec<Collection>> {
        let api_root = self.api_root().await?;
        let path = format!("{}/collections/", api_root.trim_end_matches('/'));
        let value = self.transport.get_json(&path, &[]).await?;
        let parsed: CollectionsResponse =
            serde_json::from_value(value).map_err(|e| Error::parse("collections response", e))?;
        Ok(parsed
            .collections
            .into_iter()
            .filter(|c| c.can_read)
            .collect())
    }

    /// Retrieve one page of raw objects from a collection.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn objects_page(
        &self,
        collection_id: &str,
        added_after: Option<&str>,
        next: Option<&str>,
    ) -> Result<Envelope> {
        let api_root = self.api_root().await?;
        let path = format!(
            "{}/collections/{}/objects/",
            api_root.trim_end_matches('/'),
            collection_id
        );

        let mut query = vec![("limit".to_string(), self.page_size.to_string())];
        if let Some(after) = added_after {
            query.push(("added_after".to_string(), after.to_string()));
        }
        if let Some(token) = next {
            query.push(("next".to_string(), token.to_string()));
        }

        let value = self.transport.get_json(&path, &query).await?;
        serde_json::from_value(value).map_err(|e| Error::parse("objects envelope", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct RecordingTransport {
        discovery: serde_json::Value,
        collections: serde_json::Value,
        envelope: serde_json::Value,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                discovery: serde_json::json!({
                    "title": "Test feed",
                    "api_roots": ["https://feed.test/root1/", "https://feed.test/root2/"],
                }),
                collections: serde_json::json!({
                    "collections": [
                        {"id": "col-open", "title": "Open", "can_read": true},
                        {"id": "col-locked", "title": "Locked", "can_read": false},
                        {"id": "col-reports", "title": "Reports", "can_read": true, "type": "report"},
                    ],
                }),
                envelope: serde_json::json!({ "more": false, "objects": [] }),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TaxiiTransport for RecordingTransport {
        async fn get_json(
            &self,
            path: &str,
            query: &[(String, String)],
        ) -> Result<serde_json::Value> {
            self.requests
                .lock()
                .await
                .push((path.to_string(), query.to_vec()));
            if path == "/taxii2/" {
                return Ok(self.discovery.clone());
            }
            if path.ends_with("/collections/") {
                return Ok(self.collections.clone());
            }
            Ok(self.envelope.clone())
        }
    }

    #[tokio::test]
    async fn discover_returns_the_first_api_root() {
        let client = TaxiiClient::with_transport(Arc::new(RecordingTransport::new()), 50);
        assert_eq!(client.discover().await.unwrap(), "https://feed.test/root1/");
    }

    #[tokio::test]
    async fn no_api_roots_is_not_found() {
        let mut transport = RecordingTransport::new();
        transport.discovery = serde_json::json!({ "title": "Empty", "api_roots": [] });
        let client = TaxiiClient::with_transport(Arc::new(transport), 50);
        let err = client.discover().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn readable_collections_filters_unreadable_ones() {
        let client = TaxiiClient::with_transport(Arc::new(RecordingTransport::new()), 50);
        let cols = client.readable_collections().await.unwrap();
        let ids: Vec<&str> = cols.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["col-open", "col-reports"]);
    }

    #[tokio::test]
    async fn objects_page_sends_limit_added_after_and_next() {
        let transport = Arc::new(RecordingTransport::new());
        let client = TaxiiClient::with_transport(transport.clone(), 50);

        client
            .objects_page("col-open", Some("2026-01-01T00:00:00Z"), Some("tok-2"))
            .await
            .unwrap();

        let requests = transport.requests.lock().await;
        let (path, query) = requests.last().unwrap();
        assert_eq!(path, "https://feed.test/root1/collections/col-open/objects/");
        assert!(query.contains(&("limit".to_string(), "50".to_string())));
        assert!(query.contains(&(
            "added_after".to_string(),
            "2026-01-01T00:00:00Z".to_string()
        )));
        assert!(query.contains(&("next".to_string(), "tok-2".to_string())));
    }

    #[tokio::test]
    async fn api_root_is_discovered_once() {
        let transport = Arc::new(RecordingTransport::new());
        let client = TaxiiClient::with_transport(transport.clone(), 50);

        client.objects_page("col-open", None, None).await.unwrap();
        client.objects_page("col-open", None, None).await.unwrap();

        let requests = transport.requests.lock().await;
        let discoveries = requests.iter().filter(|(p, _)| p == "/taxii2/").count();
        assert_eq!(discoveries, 1);
    }

    #[test]
    fn config_rejects_empty_url_and_username() {
        assert!(matches!(
            TaxiiConfig::new("", "user", "pass").unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            TaxiiConfig::new("https://feed.test", "  ", "pass").unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn config_trims_trailing_slash_and_defaults_page_size() {
        let cfg = TaxiiConfig::new("https://feed.test/", "user", "pass").unwrap();
        assert_eq!(cfg.server_url, "https://feed.test");
        assert_eq!(cfg.page_size, 50);
        assert!(cfg.with_page_size(0).is_err());
    }
}
