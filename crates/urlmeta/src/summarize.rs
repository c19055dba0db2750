//! HTML summarization
//!
//! Produces the minified plain-text rendering stored as `html_summary`.
//! The client treats the summarizer as a pluggable `fn(&str) -> String`;
//! this is the default implementation.

/// Elements whose text content is never part of a summary
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "head", "svg", "iframe"];

/// Strip markup from an HTML document and collapse whitespace
///
/// Script, style, and other non-content elements are dropped entirely,
/// including their text. The result is a single-line minified string.
pub fn summarize_html(html: &str) -> String {
    let mut text = String::new();
    let mut skip_stack: Vec<String> = Vec::new();
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let mut tag = String::new();
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == '>' {
                    break;
                }
                tag.push(next);
            }

            let tag_lower = tag.to_lowercase();
            let is_closing = tag_lower.starts_with('/');
            let tag_name = if is_closing {
                tag_lower[1..].split_whitespace().next().unwrap_or("")
            } else {
                tag_lower.split_whitespace().next().unwrap_or("")
            };

            if SKIP_TAGS.contains(&tag_name) {
                if is_closing {
                    if let Some(pos) = skip_stack.iter().rposition(|t| t == tag_name) {
                        skip_stack.remove(pos);
                    }
                } else if !tag.ends_with('/') {
                    skip_stack.push(tag_name.to_string());
                }
                continue;
            }

            // Tags act as word boundaries so adjacent elements don't merge
            if skip_stack.is_empty() {
                text.push(' ');
            }
            continue;
        }

        if skip_stack.is_empty() {
            text.push(c);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
