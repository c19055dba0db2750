//! urlmeta - cached metadata retrieval for URLs
//!
//! Fetches descriptive metadata (title, images, extracted text,
//! site-specific extras) for a URL, persists it to a local on-disk cache
//! keyed by the normalized URL, and returns the cached record on subsequent
//! lookups instead of re-fetching.
//!
//! ## Quick start
//!
//! ```no_run
//! use urlmeta::UrlMetadataClient;
//!
//! #[tokio::main]
//! async fn main() -> urlmeta::Result<()> {
//!     let client = UrlMetadataClient::new()?;
//!     let metadata = client.get("https://www.rust-lang.org").await?;
//!     println!("title: {:?}", metadata.title());
//!     Ok(())
//! }
//! ```
//!
//! ## Extractor system
//!
//! Site-specific behavior is pluggable: each [`SiteExtractor`] declares which
//! URLs it handles, can rewrite URLs into a canonical cache key, and enriches
//! the record after the generic fetch. The [`ExtractorRegistry`] runs them in
//! registration order. [`Youtube`] is built in.

pub mod backoff;
pub mod cache;
pub mod client;
mod error;
pub mod fetch;
pub mod model;
mod normalize;
pub mod sites;
mod summarize;

pub use backoff::FibonacciBackoff;
pub use cache::{DirCache, MetadataCache, DATA_DIR_ENV, METADATA_FILE};
pub use client::{
    ClientBuilder, Summarizer, UrlMetadataClient, DEFAULT_SLEEP_TIME, DEFAULT_SUBTITLE_LANGUAGE,
    MAX_FETCH_ATTEMPTS,
};
pub use error::{Error, Result};
pub use fetch::{
    FetchError, FetchOptions, FetchOutcome, HttpFetcher, MetadataFetcher, RawResponse,
    DEFAULT_USER_AGENT,
};
pub use model::Metadata;
pub use normalize::clean_url;
pub use sites::{ExtractConfig, ExtractContext, ExtractorRegistry, SiteExtractor, Youtube};
pub use summarize::summarize_html;
