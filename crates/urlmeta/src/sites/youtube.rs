//! YouTube extractor
//!
//! Canonicalizes the many spellings of a video URL down to one cache key and
//! enriches matching records with timed-text subtitles.

use super::{ExtractContext, SiteExtractor};
use crate::model::Metadata;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Record field holding downloaded subtitle text
pub const SUBTITLES_FIELD: &str = "subtitles";

/// Timeout for subtitle requests
const SUBTITLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Extract the video id from a YouTube URL
///
/// Accepted spellings include:
/// - `http://youtu.be/_lOT2p_FCvA`
/// - `www.youtube.com/watch?v=_lOT2p_FCvA&feature=feedu`
/// - `http://www.youtube.com/embed/_lOT2p_FCvA`
/// - `http://www.youtube.com/v/_lOT2p_FCvA?version=3`
/// - `youtube.com/watch?v=_lOT2p_FCvA`
///
/// `youtu.be/watch?v=...` is not a video URL and yields `None`, as does any
/// malformed input.
pub fn video_id(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let candidate = if trimmed.starts_with("youtu") || trimmed.starts_with("www") {
        format!("http://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?;

    if host.contains("youtube") {
        let path = parsed.path();
        if path == "/watch" {
            return parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
                .filter(|id| !id.is_empty());
        }
        if path.starts_with("/embed/") || path.starts_with("/v/") {
            return path
                .split('/')
                .nth(2)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }
        return None;
    }

    if host.contains("youtu.be") {
        let id = parsed.path().trim_start_matches('/');
        if id.is_empty() || id.contains('/') || id == "watch" {
            return None;
        }
        return Some(id.to_string());
    }

    None
}

/// Errors from the subtitle download path
#[derive(Debug, Error)]
pub enum SubtitleError {
    /// The subtitle request itself failed
    #[error("subtitle request failed: {0}")]
    Request(String),

    /// The video has no track for the requested language
    #[error("no '{lang}' subtitle track for video '{id}'")]
    TrackNotFound {
        /// The video id
        id: String,
        /// The requested language
        lang: String,
    },
}

/// Download timed-text subtitles for a video as plain text
pub async fn download_subtitles(
    id: &str,
    lang: &str,
    user_agent: Option<&str>,
) -> Result<String, SubtitleError> {
    let client = reqwest::Client::builder()
        .connect_timeout(SUBTITLE_TIMEOUT)
        .timeout(SUBTITLE_TIMEOUT)
        .build()
        .map_err(|e| SubtitleError::Request(e.to_string()))?;

    let endpoint = format!(
        "https://video.google.com/timedtext?lang={}&v={}",
        urlencoding::encode(lang),
        urlencoding::encode(id)
    );
    let mut request = client.get(&endpoint);
    if let Some(ua) = user_agent {
        request = request.header(reqwest::header::USER_AGENT, ua);
    }

    let response = request
        .send()
        .await
        .map_err(|e| SubtitleError::Request(e.to_string()))?;
    if !response.status().is_success() {
        return Err(SubtitleError::Request(format!(
            "HTTP {} from timedtext endpoint",
            response.status().as_u16()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SubtitleError::Request(e.to_string()))?;
    // The endpoint answers 200 with an empty body when no track exists
    if body.trim().is_empty() {
        return Err(SubtitleError::TrackNotFound {
            id: id.to_string(),
            lang: lang.to_string(),
        });
    }

    Ok(transcript_text(&body))
}

/// Flatten a timed-text XML document into plain transcript text
fn transcript_text(xml: &str) -> String {
    let stripped = crate::summarize::summarize_html(xml);
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Extractor for YouTube video URLs
pub struct Youtube;

impl Youtube {
    /// Create the extractor
    pub fn new() -> Self {
        Self
    }
}

impl Default for Youtube {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteExtractor for Youtube {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn matches(&self, url: &str) -> bool {
        video_id(url).is_some()
    }

    fn preprocess_url(&self, url: &str) -> String {
        match video_id(url) {
            Some(id) => format!("https://www.youtube.com/watch?v={id}"),
            None => url.to_string(),
        }
    }

    async fn extract(
        &self,
        url: &str,
        mut metadata: Metadata,
        ctx: &ExtractContext<'_>,
    ) -> Metadata {
        // The generic page summary for a video is chrome, not content
        metadata.html_summary = None;

        if ctx.config.skip_subtitles {
            return metadata;
        }
        let Some(id) = video_id(url) else {
            return metadata;
        };

        debug!(id, lang = %ctx.config.subtitle_language, "downloading youtube subtitles");
        match download_subtitles(
            &id,
            &ctx.config.subtitle_language,
            ctx.config.user_agent.as_deref(),
        )
        .await
        {
            Ok(text) => {
                metadata
                    .extra
                    .insert(SUBTITLES_FIELD.to_string(), Value::String(text));
            }
            Err(err) => {
                debug!(id, error = %err, "subtitle download failed");
            }
        }
        // A request went out either way; honor the courtesy delay
        tokio::time::sleep(ctx.config.sleep_time).await;
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_accepted_spellings() {
        for url in [
            "http://youtu.be/_lOT2p_FCvA",
            "www.youtube.com/watch?v=_lOT2p_FCvA&feature=feedu",
            "http://www.youtube.com/embed/_lOT2p_FCvA",
            "http://www.youtube.com/v/_lOT2p_FCvA?version=3",
            "https://www.youtube.com/watch?v=_lOT2p_FCvA&index=6&list=PLx",
            "youtube.com/watch?v=_lOT2p_FCvA",
        ] {
            assert_eq!(video_id(url).as_deref(), Some("_lOT2p_FCvA"), "{url}");
        }
    }

    #[test]
    fn test_video_id_rejected_spellings() {
        for url in [
            "youtu.be/watch?v=_lOT2p_FCvA",
            "https://www.youtube.com/playlist?list=PLx",
            "https://example.com/watch?v=_lOT2p_FCvA",
            "not a url at all",
            "",
        ] {
            assert_eq!(video_id(url), None, "{url}");
        }
    }

    #[test]
    fn test_preprocess_canonicalizes() {
        let yt = Youtube::new();
        let canonical = "https://www.youtube.com/watch?v=_lOT2p_FCvA";
        assert_eq!(yt.preprocess_url("http://youtu.be/_lOT2p_FCvA"), canonical);
        // Idempotent on its own output
        assert_eq!(yt.preprocess_url(canonical), canonical);
        // Identity for unrelated URLs
        assert_eq!(
            yt.preprocess_url("https://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_matches() {
        let yt = Youtube::new();
        assert!(yt.matches("https://www.youtube.com/watch?v=abc123def45"));
        assert!(!yt.matches("https://example.com"));
        assert!(!yt.matches("::: garbage :::"));
    }

    #[test]
    fn test_transcript_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.0" dur="2.5">hello there</text>
  <text start="2.5" dur="3.0">it&#39;s a test &amp; more</text>
</transcript>"#;
        assert_eq!(transcript_text(xml), "hello there it's a test & more");
    }
}
