//! Site-specific extractor system
//!
//! Extractors run after the generic fetch/summarize step to patch or extend
//! the metadata for URLs they recognize. [`ExtractorRegistry`] dispatches in
//! registration order; each extractor receives the output of the previous
//! one, so later extractors can see earlier enrichment.

mod youtube;

pub use youtube::Youtube;

use crate::fetch::RawResponse;
use crate::model::Metadata;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Read-only client configuration visible to extractors
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Courtesy delay between outbound requests
    pub sleep_time: Duration,
    /// Preferred subtitle language for video sites
    pub subtitle_language: String,
    /// Skip subtitle downloads entirely
    pub skip_subtitles: bool,
    /// Custom User-Agent for extractor-issued requests
    pub user_agent: Option<String>,
}

/// Per-dispatch context handed to extractors explicitly
///
/// Carries the orchestrator's last captured response and the client's
/// configuration, instead of a back-reference to the client itself.
pub struct ExtractContext<'a> {
    /// The last raw response from the generic fetch, if one was captured
    pub response: Option<&'a RawResponse>,
    /// The client's read-only configuration
    pub config: &'a ExtractConfig,
}

/// Trait for site-specific metadata extractors
///
/// Implementations are stateless strategy objects, constructed once and
/// invoked per URL.
#[async_trait]
pub trait SiteExtractor: Send + Sync {
    /// Unique identifier for this extractor (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Whether this extractor applies to the URL
    ///
    /// Pure predicate: must not perform I/O and must return false (never
    /// panic) for malformed input.
    fn matches(&self, url: &str) -> bool;

    /// Rewrite a URL into its canonical spelling for this site
    ///
    /// Must be idempotent and return the input unchanged for URLs this
    /// extractor does not recognize.
    fn preprocess_url(&self, url: &str) -> String {
        url.to_string()
    }

    /// Enrich the record for a matching URL
    ///
    /// Called only when [`matches`](Self::matches) is true, after the generic
    /// fetch and summarization. May issue its own requests. Must not clear
    /// generic fields it does not intend to replace.
    async fn extract(
        &self,
        url: &str,
        metadata: Metadata,
        ctx: &ExtractContext<'_>,
    ) -> Metadata;
}

/// Ordered registry of site extractors
///
/// Registration order is fixed at construction and determines both URL
/// preprocessing order and extraction order.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn SiteExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Create a registry with the built-in extractors registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Youtube::new()));
        registry
    }

    /// Register an extractor
    ///
    /// A suspicious extractor (blank or duplicate name) is logged but still
    /// registered: availability wins over strict enforcement at this
    /// boundary.
    pub fn register(&mut self, extractor: Box<dyn SiteExtractor>) {
        let name = extractor.name();
        if name.trim().is_empty() {
            warn!("registering site extractor with a blank name");
        } else if self.extractors.iter().any(|e| e.name() == name) {
            warn!(extractor = name, "extractor name already registered");
        }
        self.extractors.push(extractor);
    }

    /// Number of registered extractors
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Fold every extractor's URL rewrite over the input, in order
    pub fn preprocess(&self, url: &str) -> String {
        let mut current = url.to_string();
        for extractor in &self.extractors {
            current = extractor.preprocess_url(&current);
        }
        current
    }

    /// Run every matching extractor over the record, in order
    pub async fn dispatch(
        &self,
        url: &str,
        mut metadata: Metadata,
        ctx: &ExtractContext<'_>,
    ) -> Metadata {
        for extractor in &self.extractors {
            if extractor.matches(url) {
                debug!(extractor = extractor.name(), url, "running site extractor");
                metadata = extractor.extract(url, metadata, ctx).await;
            }
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    struct Tagger {
        name: &'static str,
        key: &'static str,
    }

    #[async_trait]
    impl SiteExtractor for Tagger {
        fn name(&self) -> &'static str {
            self.name
        }

        fn matches(&self, url: &str) -> bool {
            url.contains("example.com")
        }

        async fn extract(
            &self,
            _url: &str,
            mut metadata: Metadata,
            _ctx: &ExtractContext<'_>,
        ) -> Metadata {
            // Record how many extractor fields were already present, so
            // ordering is observable
            let seen = metadata.extra.len();
            metadata.extra.insert(self.key.to_string(), json!(seen));
            metadata
        }
    }

    fn test_config() -> ExtractConfig {
        ExtractConfig {
            sleep_time: Duration::ZERO,
            subtitle_language: "en".to_string(),
            skip_subtitles: true,
            user_agent: None,
        }
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.extractors[0].name(), "youtube");
    }

    #[test]
    fn test_duplicate_name_still_registered() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(Tagger { name: "dup", key: "a" }));
        registry.register(Box::new(Tagger { name: "dup", key: "b" }));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_order_and_visibility() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(Tagger {
            name: "first",
            key: "first",
        }));
        registry.register(Box::new(Tagger {
            name: "second",
            key: "second",
        }));

        let config = test_config();
        let ctx = ExtractContext {
            response: None,
            config: &config,
        };
        let metadata = Metadata::new("https://example.com", Utc::now());
        let result = registry.dispatch("https://example.com", metadata, &ctx).await;

        // The second extractor observed the first's field
        assert_eq!(result.extra.get("first"), Some(&json!(0)));
        assert_eq!(result.extra.get("second"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_dispatch_skips_non_matching() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(Tagger {
            name: "first",
            key: "first",
        }));

        let config = test_config();
        let ctx = ExtractContext {
            response: None,
            config: &config,
        };
        let metadata = Metadata::new("https://other.net", Utc::now());
        let result = registry.dispatch("https://other.net", metadata, &ctx).await;
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_preprocess_default_is_identity() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(Tagger { name: "t", key: "t" }));
        assert_eq!(
            registry.preprocess("https://example.com/x"),
            "https://example.com/x"
        );
    }
}
