//! The `urlmeta` client: cache-backed metadata retrieval
//!
//! [`UrlMetadataClient::get`] is the single entry point. Control flow per
//! call: normalize the URL, check the cache, and on a miss fetch with
//! bounded retry, summarize, run site extractors, then store. A URL is
//! fetched at most once for the lifetime of its cache entry.

use crate::backoff::FibonacciBackoff;
use crate::cache::{resolve_cache_root, MetadataCache};
use crate::error::{Error, Result};
use crate::fetch::{FetchError, FetchOptions, HttpFetcher, MetadataFetcher, RawResponse};
use crate::model::Metadata;
use crate::normalize::clean_url;
use crate::sites::{ExtractConfig, ExtractContext, ExtractorRegistry, SiteExtractor};
use crate::summarize::summarize_html;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default courtesy delay between outbound requests
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(5);

/// Default subtitle language for video sites
pub const DEFAULT_SUBTITLE_LANGUAGE: &str = "en";

/// Total fetch attempts per URL, including the first
pub const MAX_FETCH_ATTEMPTS: usize = 3;

/// Fibonacci terms skipped before the first backoff delay (schedule starts
/// at 13 seconds)
pub const BACKOFF_SKIP: usize = 6;

/// Pluggable HTML summarization function
pub type Summarizer = fn(&str) -> String;

/// Cache-backed URL metadata client
///
/// Construct with [`UrlMetadataClient::builder`]; the zero-configuration
/// [`UrlMetadataClient::new`] uses the platform data directory and the
/// built-in HTTP fetcher.
pub struct UrlMetadataClient {
    cache_root: PathBuf,
    cache: MetadataCache,
    fetcher: Box<dyn MetadataFetcher>,
    registry: ExtractorRegistry,
    fetch_options: FetchOptions,
    extract_config: ExtractConfig,
    summarizer: Summarizer,
    backoff_unit: Duration,
}

impl UrlMetadataClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start configuring a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The resolved cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Normalize a raw URL into its cache key
    ///
    /// Generic pass (percent-decode, trim) followed by each registered
    /// extractor's rewrite in registration order. Pure; performs no I/O.
    pub fn normalize_url(&self, url: &str) -> String {
        self.registry.preprocess(&clean_url(url))
    }

    /// Get metadata for a URL, fetching and caching on first sight
    ///
    /// Returns the stored record on a cache hit. On a miss the URL is
    /// fetched (ordinary network failure degrades to a record with absent
    /// fields, never an error), enriched by site extractors, stored, and
    /// returned. An entry the index reports as present but that cannot be
    /// read is a fatal [`Error::CacheInconsistent`] — not a silent re-fetch.
    pub async fn get(&self, url: &str) -> Result<Metadata> {
        let uurl = self.normalize_url(url);
        if !self.cache.has(&uurl)? {
            let metadata = self.request_data(&uurl).await;
            self.cache.put(&uurl, &metadata)?;
            return Ok(metadata);
        }
        match self.cache.get(&uurl) {
            Ok(Some(metadata)) => Ok(metadata),
            Ok(None) => Err(Error::CacheInconsistent { url: uurl }),
            Err(err) => {
                warn!(url = %uurl, error = %err, "failed to read cache entry reported present");
                Err(Error::CacheInconsistent { url: uurl })
            }
        }
    }

    /// Whether a URL already has cached metadata
    pub fn in_cache(&self, url: &str) -> Result<bool> {
        self.cache.has(&self.normalize_url(url))
    }

    /// The on-disk cache directory for a URL, if it has been cached
    pub fn cache_dir_for(&self, url: &str) -> Result<Option<PathBuf>> {
        self.cache.entry_dir(&self.normalize_url(url))
    }

    /// Fetch and assemble a fresh record for a normalized URL
    ///
    /// Always produces a record: rate limiting is retried on the Fibonacci
    /// schedule, anything else degrades to absent fields. Does not touch the
    /// cache.
    pub async fn request_data(&self, url: &str) -> Metadata {
        let mut metadata = Metadata::new(url, Utc::now());

        // The captured response starts clean for every fetch so stale data
        // from a previous URL cannot leak into this record
        let mut last_response: Option<RawResponse> = None;

        let mut delays = FibonacciBackoff::new(BACKOFF_SKIP, MAX_FETCH_ATTEMPTS)
            .delays(self.backoff_unit)
            .into_iter();
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            debug!(url, attempt, "fetching metadata");
            match self.fetcher.fetch_metadata(url, &self.fetch_options).await {
                Ok(outcome) => {
                    metadata.info = outcome.fields;
                    if outcome.response.is_some() {
                        last_response = outcome.response;
                    }
                    break;
                }
                Err(FetchError::RateLimited { .. }) if attempt < MAX_FETCH_ATTEMPTS => {
                    let delay = delays.next().unwrap_or_default();
                    warn!(
                        url,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(url, error = %err, "could not retrieve metadata");
                    break;
                }
            }
        }

        // Courtesy delay after the fetch, success or not
        tokio::time::sleep(self.extract_config.sleep_time).await;

        if metadata.info.is_some() {
            if let Some(response) = &last_response {
                if !response.body.is_empty() {
                    if response.is_success() {
                        metadata.html_summary = Some((self.summarizer)(&response.body));
                    } else {
                        warn!(
                            url,
                            status = response.status,
                            "response status is failing, skipping HTML summarization"
                        );
                    }
                }
            }
        }

        let ctx = ExtractContext {
            response: last_response.as_ref(),
            config: &self.extract_config,
        };
        self.registry.dispatch(url, metadata, &ctx).await
    }
}

/// Builder for [`UrlMetadataClient`]
pub struct ClientBuilder {
    cache_dir: Option<PathBuf>,
    sleep_time: Duration,
    subtitle_language: String,
    skip_subtitles: bool,
    user_agent: Option<String>,
    include_file_content: bool,
    all_images: bool,
    fetcher: Option<Box<dyn MetadataFetcher>>,
    summarizer: Summarizer,
    backoff_unit: Duration,
    extractors: Vec<Box<dyn SiteExtractor>>,
    default_extractors: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            sleep_time: DEFAULT_SLEEP_TIME,
            subtitle_language: DEFAULT_SUBTITLE_LANGUAGE.to_string(),
            skip_subtitles: false,
            user_agent: None,
            include_file_content: true,
            all_images: true,
            fetcher: None,
            summarizer: summarize_html,
            backoff_unit: Duration::from_secs(1),
            extractors: Vec::new(),
            default_extractors: true,
        }
    }
}

impl ClientBuilder {
    /// Set the cache root directory explicitly
    ///
    /// When unset, the `URLMETA_DATA_DIR` environment variable and then the
    /// platform user-data directory are tried, in that order.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Courtesy delay between outbound requests
    pub fn sleep_time(mut self, sleep_time: Duration) -> Self {
        self.sleep_time = sleep_time;
        self
    }

    /// Preferred subtitle language for video sites
    pub fn subtitle_language(mut self, lang: impl Into<String>) -> Self {
        self.subtitle_language = lang.into();
        self
    }

    /// Skip subtitle downloads entirely
    pub fn skip_subtitles(mut self, skip: bool) -> Self {
        self.skip_subtitles = skip;
        self
    }

    /// Custom User-Agent for all outbound requests
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Include the raw body as a `content` field for non-HTML responses
    pub fn include_file_content(mut self, include: bool) -> Self {
        self.include_file_content = include;
        self
    }

    /// Collect every `<img>` in the page body, not just `og:image`
    pub fn all_images(mut self, all: bool) -> Self {
        self.all_images = all;
        self
    }

    /// Substitute the fetch collaborator (tests, embedders)
    pub fn fetcher(mut self, fetcher: Box<dyn MetadataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Substitute the HTML summarizer
    pub fn summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Time unit for the backoff schedule; tests pass `Duration::ZERO`
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Register an additional site extractor, after the defaults
    pub fn extractor(mut self, extractor: Box<dyn SiteExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Skip registering the built-in extractors
    pub fn no_default_extractors(mut self) -> Self {
        self.default_extractors = false;
        self
    }

    /// Build the client
    ///
    /// Resolves and validates the cache root: a path that exists but is not
    /// a directory is a fatal configuration error; missing directories are
    /// created.
    pub fn build(self) -> Result<UrlMetadataClient> {
        let cache_root = resolve_cache_root(self.cache_dir)?;
        if cache_root.exists() && !cache_root.is_dir() {
            return Err(Error::CacheRoot(format!(
                "'{}' already exists but is not a directory",
                cache_root.display()
            )));
        }
        let cache = MetadataCache::new(cache_root.join("data"))?;

        let mut registry = if self.default_extractors {
            ExtractorRegistry::with_defaults()
        } else {
            ExtractorRegistry::new()
        };
        for extractor in self.extractors {
            registry.register(extractor);
        }

        let fetcher: Box<dyn MetadataFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(HttpFetcher::new()?),
        };

        Ok(UrlMetadataClient {
            cache_root,
            cache,
            fetcher,
            registry,
            fetch_options: FetchOptions {
                include_file_content: self.include_file_content,
                all_images: self.all_images,
                user_agent: self.user_agent.clone(),
            },
            extract_config: ExtractConfig {
                sleep_time: self.sleep_time,
                subtitle_language: self.subtitle_language,
                skip_subtitles: self.skip_subtitles,
                user_agent: self.user_agent,
            },
            summarizer: self.summarizer,
            backoff_unit: self.backoff_unit,
        })
    }
}
