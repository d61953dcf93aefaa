/// Zotero Web API client implementation.
///
/// This module provides `ZoteroClient` for making synchronous HTTP requests to
/// the Zotero Web API v3, along with error types and a builder for configuration.
use std::time::Duration;

use reqwest::blocking::Response;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{Item, LibraryRef};

/// Public Zotero API endpoint used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "https://api.zotero.org";

const API_VERSION: &str = "3";
/// Full item listing, child notes and attachments included. Tag deletion is
/// library-wide, so every item carrying a tag has to be reconciled.
const ITEMS_PATH: &str = "/items";
const TOTAL_RESULTS: &str = "total-results";
const LAST_MODIFIED_VERSION: &str = "last-modified-version";
const IF_UNMODIFIED_SINCE_VERSION: &str = "if-unmodified-since-version";

/// Errors that can occur when interacting with the Zotero API.
#[derive(Debug, Error)]
pub enum ZoteroError {
    /// Network-related errors (connection failures, DNS resolution, timeouts)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-success HTTP status, with whatever message the server returned
    #[error("HTTP error: status {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected JSON shape
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A header the protocol relies on was absent or not a number
    #[error("Missing or invalid response header: {0}")]
    MissingHeader(&'static str),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Required client configuration was not supplied or is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub entries: Vec<T>,
    /// Total number of results the server reports for the whole listing.
    pub total: usize,
}

/// Operations the tag rewriter needs from a remote library.
///
/// This trait enables mocking in unit tests and keeps the HTTP details out
/// of the catalog loader, the write-back phase and the driver.
pub trait ZoteroApi {
    /// Fetches one page of items, child items included, starting at offset
    /// `start`.
    fn fetch_items(&self, start: usize, limit: usize) -> Result<Page<Item>, ZoteroError>;

    /// Fetches one page of tag names starting at offset `start`.
    fn fetch_tags(&self, start: usize, limit: usize) -> Result<Page<String>, ZoteroError>;

    /// Attaches `tags` to `item`, keeping the tags it already has.
    fn add_tags(&self, item: &Item, tags: &[String]) -> Result<(), ZoteroError>;

    /// Removes `tags` from every item in the library.
    ///
    /// Callers are responsible for keeping each call within the server's
    /// per-request limit.
    fn delete_tags(&self, tags: &[String]) -> Result<(), ZoteroError>;
}

/// Builder for constructing `ZoteroClient` instances.
///
/// # Examples
///
/// ```
/// use zottag::{LibraryRef, LibraryType};
/// use zottag::zotero::ZoteroClientBuilder;
///
/// let client = ZoteroClientBuilder::new()
///     .library(LibraryRef::new("475425", LibraryType::User))
///     .api_key("P9NiFoyLeZu2bZNvvuQPDWsd")
///     .base_url("https://api.zotero.org")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct ZoteroClientBuilder {
    library: Option<LibraryRef>,
    api_key: Option<String>,
    base_url: Option<String>,
}

impl ZoteroClientBuilder {
    /// Creates a new `ZoteroClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the library every request is scoped to.
    pub fn library(mut self, library: LibraryRef) -> Self {
        self.library = Some(library);
        self
    }

    /// Sets the API key sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for the Zotero API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "https://api.zotero.org")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the `ZoteroClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method will check the
    /// `ZOTERO_API_BASE` environment variable. If not set, it defaults to
    /// `https://api.zotero.org`.
    ///
    /// # Errors
    ///
    /// Returns `ZoteroError::Config` if the library or API key is missing or
    /// the key is not a valid header value, and `ZoteroError::InvalidUrl` if
    /// the base URL does not parse.
    pub fn build(self) -> Result<ZoteroClient, ZoteroError> {
        let library = self
            .library
            .ok_or_else(|| ZoteroError::Config("library is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| ZoteroError::Config("API key is required".to_string()))?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("ZOTERO_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| ZoteroError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("zotero-api-version", HeaderValue::from_static(API_VERSION));
        let mut key_value = HeaderValue::from_str(&api_key)
            .map_err(|_| ZoteroError::Config("API key contains invalid characters".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert("zotero-api-key", key_value);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ZoteroError::Network)?;

        Ok(ZoteroClient {
            client,
            base_url,
            library,
        })
    }
}

/// Synchronous HTTP client for one Zotero library.
///
/// It should be constructed using `ZoteroClientBuilder`.
pub struct ZoteroClient {
    client: reqwest::blocking::Client,
    base_url: String,
    library: LibraryRef,
}

/// Items come wrapped in an envelope; the editable fields live under `data`.
#[derive(Deserialize)]
struct ItemEnvelope {
    data: Item,
}

#[derive(Deserialize)]
struct TagRecord {
    tag: String,
}

impl ZoteroClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the library this client is scoped to.
    pub fn library(&self) -> &LibraryRef {
        &self.library
    }

    /// Builds the full URL for a library-scoped path such as `/items`.
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.library.path_prefix(), path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, ZoteroError> {
        let url = self.endpoint(path);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(ZoteroError::Network)?;

        ensure_success(response)
    }

    /// Reads the current library version, required for conditional deletes.
    fn library_version(&self) -> Result<u64, ZoteroError> {
        let response = self.get(
            ITEMS_PATH,
            &[("limit", "1".to_string()), ("format", "keys".to_string())],
        )?;
        header_number(response.headers(), LAST_MODIFIED_VERSION)
    }
}

impl ZoteroApi for ZoteroClient {
    fn fetch_items(&self, start: usize, limit: usize) -> Result<Page<Item>, ZoteroError> {
        let response = self.get(
            ITEMS_PATH,
            &[
                ("format", "json".to_string()),
                ("start", start.to_string()),
                ("limit", limit.to_string()),
            ],
        )?;
        let total = header_number(response.headers(), TOTAL_RESULTS)?;
        let body = response.text().map_err(ZoteroError::Network)?;

        Ok(Page {
            entries: parse_items(&body)?,
            total: total as usize,
        })
    }

    fn fetch_tags(&self, start: usize, limit: usize) -> Result<Page<String>, ZoteroError> {
        let response = self.get(
            "/tags",
            &[("start", start.to_string()), ("limit", limit.to_string())],
        )?;
        let total = header_number(response.headers(), TOTAL_RESULTS)?;
        let body = response.text().map_err(ZoteroError::Network)?;

        Ok(Page {
            entries: parse_tags(&body)?,
            total: total as usize,
        })
    }

    fn add_tags(&self, item: &Item, tags: &[String]) -> Result<(), ZoteroError> {
        let url = self.endpoint(&format!("/items/{}", item.key()));
        let body = serde_json::json!({ "tags": item.merged_tags(tags) });
        debug!(%url, version = item.version(), ?tags, "PATCH");

        let response = self
            .client
            .patch(&url)
            .header(IF_UNMODIFIED_SINCE_VERSION, item.version())
            .json(&body)
            .send()
            .map_err(ZoteroError::Network)?;

        ensure_success(response).map(|_| ())
    }

    fn delete_tags(&self, tags: &[String]) -> Result<(), ZoteroError> {
        if tags.is_empty() {
            return Ok(());
        }

        let version = self.library_version()?;
        let url = self.endpoint("/tags");
        debug!(%url, version, count = tags.len(), "DELETE");

        let response = self
            .client
            .delete(&url)
            .query(&[("tag", tag_query(tags))])
            .header(IF_UNMODIFIED_SINCE_VERSION, version)
            .send()
            .map_err(ZoteroError::Network)?;

        ensure_success(response).map(|_| ())
    }
}

/// Turns non-success statuses into `ZoteroError::Http`, keeping the body text.
fn ensure_success(response: Response) -> Result<Response, ZoteroError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().unwrap_or_default();
    Err(ZoteroError::Http {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

fn header_number(headers: &HeaderMap, name: &'static str) -> Result<u64, ZoteroError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or(ZoteroError::MissingHeader(name))
}

fn parse_items(body: &str) -> Result<Vec<Item>, ZoteroError> {
    let envelopes: Vec<ItemEnvelope> =
        serde_json::from_str(body).map_err(ZoteroError::Serialization)?;
    Ok(envelopes.into_iter().map(|envelope| envelope.data).collect())
}

fn parse_tags(body: &str) -> Result<Vec<String>, ZoteroError> {
    let records: Vec<TagRecord> =
        serde_json::from_str(body).map_err(ZoteroError::Serialization)?;
    Ok(records.into_iter().map(|record| record.tag).collect())
}

/// Joins tags the way the API expects several tags in one `tag` parameter.
fn tag_query(tags: &[String]) -> String {
    tags.join(" || ")
}
