//! Fetch collaborator contract and the built-in HTTP implementation
//!
//! The client treats fetching as an opaque operation returning parsed fields
//! *plus* the raw response it used, so downstream summarization and site
//! extractors can inspect the actual page without any hidden response
//! capture. [`HttpFetcher`] is the default implementation; tests and embedders
//! can substitute their own [`MetadataFetcher`].

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("urlmeta/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for metadata requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout for metadata requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The last raw HTTP response received during one logical fetch
///
/// A logical fetch may involve several requests (redirects, probes); only the
/// final one matters for summarization and extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Decoded response body
    pub body: String,
}

impl RawResponse {
    /// Whether the status code indicates success (< 400)
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Options controlling what a fetch collects
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Include the raw body as a `content` field for non-HTML responses
    pub include_file_content: bool,
    /// Collect every `<img>` in the page body, not just `og:image`
    pub all_images: bool,
    /// Custom User-Agent
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_file_content: true,
            all_images: true,
            user_agent: None,
        }
    }
}

/// Result of one fetch: parsed generic fields plus the raw response
///
/// `fields` is `None` when the page could not be parsed (for example a
/// failing status); the response may still be captured in that case.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Generic metadata fields (title, description, images, ...)
    pub fields: Option<Map<String, Value>>,
    /// The last raw response received during this fetch
    pub response: Option<RawResponse>,
}

/// Errors from a fetch collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered HTTP 429; the only retryable classification
    #[error("rate limited (HTTP 429) fetching '{url}'")]
    RateLimited {
        /// The URL that was throttled
        url: String,
    },

    /// Failed to build the HTTP client
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Any other request failure; never retried
    #[error("request failed: {0}")]
    Request(String),
}

/// Opaque metadata-fetch collaborator
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch a URL and return parsed fields plus the raw response
    async fn fetch_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, FetchError>;
}

/// Built-in reqwest-backed fetcher extracting generic page metadata
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeouts
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HttpFetcher {
    async fn fetch_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, FetchError> {
        debug!(url, "fetching page metadata");
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let raw = RawResponse {
            status,
            content_type,
            body,
        };

        // A failing status yields no fields but still captures the response,
        // so callers can log and inspect it
        if !raw.is_success() {
            return Ok(FetchOutcome {
                fields: None,
                response: Some(raw),
            });
        }

        let fields = extract_fields(url, &raw, options);
        Ok(FetchOutcome {
            fields: Some(fields),
            response: Some(raw),
        })
    }
}

/// Pull generic metadata fields out of a successful response
fn extract_fields(url: &str, raw: &RawResponse, options: &FetchOptions) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("url".to_string(), json!(url));
    if let Some(ct) = &raw.content_type {
        fields.insert("media_type".to_string(), json!(ct));
    }

    if is_html(&raw.content_type, &raw.body) {
        if let Some(title) = tag_text(&raw.body, "title") {
            fields.insert("title".to_string(), json!(title));
        }
        for (field, names) in [
            ("description", &["description", "og:description"][..]),
            ("keywords", &["keywords"][..]),
            ("site_name", &["og:site_name"][..]),
            ("type", &["og:type"][..]),
        ] {
            if let Some(value) = names.iter().find_map(|name| meta_content(&raw.body, name)) {
                fields.insert(field.to_string(), json!(value));
            }
        }
        let images = collect_images(&raw.body, options.all_images);
        if !images.is_empty() {
            fields.insert("images".to_string(), Value::Array(images));
        }
    } else if options.include_file_content {
        fields.insert("content".to_string(), json!(raw.body));
    }

    fields
}

/// Check if content looks like HTML based on content type and body
fn is_html(content_type: &Option<String>, body: &str) -> bool {
    if let Some(ct) = content_type {
        let ct_lower = ct.to_lowercase();
        if ct_lower.contains("text/html") || ct_lower.contains("application/xhtml") {
            return true;
        }
    }
    let trimmed = body.trim_start();
    trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html")
}

/// Text content of the first `<tag>...</tag>` element
fn tag_text(html: &str, tag: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let start = lower.find(&open)?;
    let content_start = start + lower[start..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find(&close)?;
    let text = html[content_start..content_end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Content attribute of the first `<meta>` whose name/property matches `key`
fn meta_content(html: &str, key: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find("<meta") {
        let tag_start = search_from + offset;
        let tag_end = match lower[tag_start..].find('>') {
            Some(end) => tag_start + end,
            None => break,
        };
        let tag = &html[tag_start..tag_end];
        let named = attr_value(tag, "name").or_else(|| attr_value(tag, "property"));
        if named.as_deref() == Some(key) {
            if let Some(content) = attr_value(tag, "content") {
                if !content.is_empty() {
                    return Some(content);
                }
            }
        }
        search_from = tag_end;
    }
    None
}

/// Quoted value of an attribute inside a tag's text
fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{attr}=");
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find(&needle) {
        let at = search_from + offset;
        // Reject longer attribute names ending with the same suffix
        let preceded_ok = at == 0
            || lower[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let value_start = at + needle.len();
        if preceded_ok {
            let rest = &tag[value_start..];
            let mut chars = rest.chars();
            return match chars.next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &rest[1..];
                    inner.find(quote).map(|end| inner[..end].to_string())
                }
                Some(_) => {
                    let end = rest
                        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                        .unwrap_or(rest.len());
                    Some(rest[..end].to_string())
                }
                None => None,
            };
        }
        search_from = value_start;
    }
    None
}

/// Image references: `og:image` first, then page `<img>` tags when requested
fn collect_images(html: &str, all_images: bool) -> Vec<Value> {
    let mut images = Vec::new();
    if let Some(src) = meta_content(html, "og:image") {
        images.push(json!({ "src": src, "type": "og:image" }));
    }
    if all_images {
        let lower = html.to_ascii_lowercase();
        let mut search_from = 0;
        while let Some(offset) = lower[search_from..].find("<img") {
            let tag_start = search_from + offset;
            let tag_end = match lower[tag_start..].find('>') {
                Some(end) => tag_start + end,
                None => break,
            };
            if let Some(src) = attr_value(&html[tag_start..tag_end], "src") {
                if !src.is_empty() {
                    images.push(json!({ "src": src, "type": "body_image" }));
                }
            }
            search_from = tag_end;
        }
    }
    images
}
