//! Local measurements over extracted page content.
//!
//! Word counts are computed here rather than trusted from the model: markup
//! is stripped first, then maximal runs of word characters are counted.

use scraper::{Html, Selector};

/// True when the content looks like an HTML document or fragment.
pub fn looks_like_html(content: &str) -> bool {
    let head = content.trim_start();
    let lower: String = head.chars().take(256).collect::<String>().to_ascii_lowercase();
    lower.starts_with("<!doctype html")
        || lower.starts_with("<html")
        || lower.contains("<body")
        || lower.contains("<p>")
        || lower.contains("<h1")
}

/// Returns the visible text of `content`, stripping HTML if present.
pub fn visible_text(content: &str) -> String {
    if !looks_like_html(content) {
        return content.to_string();
    }

    let document = Html::parse_document(content);
    let mut parts: Vec<&str> = Vec::new();

    // Skip script/style payloads, which `text()` would otherwise include.
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let inside_noise = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !inside_noise {
                parts.push(&**text);
            }
        }
    }

    parts.join(" ")
}

/// Counts words the way `\b\w+\b` would over the visible text.
pub fn count_words(content: &str) -> u64 {
    let text = visible_text(content);
    let mut count = 0u64;
    let mut in_word = false;

    for ch in text.chars() {
        let is_word_char = ch.is_alphanumeric() || ch == '_';
        if is_word_char && !in_word {
            count += 1;
        }
        in_word = is_word_char;
    }

    count
}

/// Best-effort page title: `<title>` / first `<h1>` for HTML, first
/// markdown heading otherwise.
pub fn extract_title(content: &str) -> Option<String> {
    if looks_like_html(content) {
        return html_title(content);
    }

    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}

fn html_title(content: &str) -> Option<String> {
    let document = Html::parse_document(content);

    ["title", "h1"].iter().find_map(|selector_str| {
        let selector = Selector::parse(selector_str).ok()?;
        let element = document.select(&selector).next()?;
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!text.is_empty()).then_some(text)
    })
}

/// Truncates to at most `max_chars` characters, preferring a word boundary.
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let truncated = &text[..cut];

    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", &text[..last_space]),
        _ => format!("{truncated}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Rust SEO Guide</title><style>body { color: red; }</style></head>
<body>
  <script>var tracking = "ignore these words";</script>
  <h1>Main Heading</h1>
  <p>Hello world, this is <strong>five</strong> words.</p>
</body>
</html>"#;

    #[test]
    fn test_count_words_plain_text() {
        assert_eq!(count_words("one two  three\nfour"), 4);
    }

    #[test]
    fn test_count_words_ignores_punctuation() {
        assert_eq!(count_words("Hello, world! It's -- 2025."), 5);
    }

    #[test]
    fn test_count_words_markdown() {
        let md = "# Title Here\n\n- item one\n- **bold** text [link](https://x.io)";
        // Title Here item one bold text link https x io
        assert_eq!(count_words(md), 10);
    }

    #[test]
    fn test_count_words_empty() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t"), 0);
    }

    #[test]
    fn test_count_words_html_skips_script_and_style() {
        // Rust SEO Guide / Main Heading / Hello world this is five words
        assert_eq!(count_words(ARTICLE_HTML), 11);
    }

    #[test]
    fn test_count_words_unicode() {
        assert_eq!(count_words("café naïve résumé"), 3);
    }

    #[test]
    fn test_extract_title_html_prefers_title_tag() {
        assert_eq!(extract_title(ARTICLE_HTML).as_deref(), Some("Rust SEO Guide"));
    }

    #[test]
    fn test_extract_title_html_falls_back_to_h1() {
        let html = "<html><body><h1>  Only   Heading </h1><p>x</p></body></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Only Heading"));
    }

    #[test]
    fn test_extract_title_markdown() {
        let md = "Intro line\n\n## Getting Started with Axum\n\nBody";
        assert_eq!(extract_title(md).as_deref(), Some("Getting Started with Axum"));
    }

    #[test]
    fn test_extract_title_none() {
        assert_eq!(extract_title("just text"), None);
        assert_eq!(extract_title("#\nbody"), None);
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_content("short", 10), "short");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        assert_eq!(truncate_content("alpha beta gamma", 12), "alpha beta...");
    }

    #[test]
    fn test_truncate_without_whitespace() {
        assert_eq!(truncate_content("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_truncate_multibyte_is_char_safe() {
        let out = truncate_content("ééééé ééééé", 7);
        assert_eq!(out, "ééééé...");
    }
}
