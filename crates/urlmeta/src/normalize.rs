//! Generic URL normalization
//!
//! The full cache key is produced by [`clean_url`] followed by each
//! registered extractor's URL rewrite in registration order; see
//! [`crate::client::UrlMetadataClient::normalize_url`].

/// Percent-decode a URL and trim surrounding whitespace
///
/// Pure and infallible: a URL that decodes to invalid UTF-8 is used as-is
/// rather than failing, since normalization must never error.
pub fn clean_url(url: &str) -> String {
    match urlencoding::decode(url) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => url.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            clean_url("https://example.com/a%20b"),
            "https://example.com/a b"
        );
        assert_eq!(
            clean_url("https://example.com/caf%C3%A9"),
            "https://example.com/café"
        );
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(clean_url("  https://example.com \n"), "https://example.com");
    }

    #[test]
    fn test_idempotent_on_plain_urls() {
        let url = "https://example.com/path?q=1";
        assert_eq!(clean_url(url), url);
        assert_eq!(clean_url(&clean_url(url)), clean_url(url));
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        // %FF is not valid UTF-8 on its own; the raw string survives
        assert_eq!(clean_url(" https://example.com/%FF "), "https://example.com/%FF");
    }
}
