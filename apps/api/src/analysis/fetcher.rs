//! Content Fetcher: pulls page content through the extraction provider.
//!
//! `ContentFetcher` is the seam; `TavilyFetcher` is the production adapter.
//! No caching and no retries: a failed fetch fails the request.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::text_stats::{count_words, extract_title};

const TAVILY_EXTRACT_URL: &str = "https://api.tavily.com/extract";

/// Page content held for the lifetime of a single analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub url: String,
    pub raw_text: String,
    pub title: Option<String>,
    pub word_count: u64,
}

impl ExtractedContent {
    pub fn new(url: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            url: url.into(),
            title: extract_title(&raw_text),
            word_count: count_words(&raw_text),
            raw_text,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("no content extracted: {0}")]
    NoContent(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// A fetch failure, tagged with the URL that caused it.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {failure}")]
pub struct ContentFetchError {
    pub url: String,
    #[source]
    pub failure: FetchFailure,
}

impl ContentFetchError {
    pub fn new(url: impl Into<String>, failure: FetchFailure) -> Self {
        Self {
            url: url.into(),
            failure,
        }
    }
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_content(&self, url: &str) -> Result<ExtractedContent, ContentFetchError>;
}

/// Fetches every URL concurrently. Fails fast: the first error cancels the
/// remaining fetches and is returned.
pub async fn fetch_content_many(
    fetcher: &dyn ContentFetcher,
    urls: &[String],
) -> Result<Vec<ExtractedContent>, ContentFetchError> {
    try_join_all(urls.iter().map(|url| fetcher.fetch_content(url))).await
}

// ────────────────────────────────────────────────────────────────────────────
// Tavily Extract adapter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TavilyExtractRequest<'a> {
    urls: [&'a str; 1],
    extract_depth: &'a str,
    format: &'a str,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyExtractResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    failed_results: Vec<TavilyFailedResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    raw_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyFailedResult {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct TavilyFetcher {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl TavilyFetcher {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchFailure {
        if error.is_timeout() {
            FetchFailure::Timeout(self.timeout)
        } else {
            FetchFailure::Http(error)
        }
    }
}

#[async_trait]
impl ContentFetcher for TavilyFetcher {
    async fn fetch_content(&self, url: &str) -> Result<ExtractedContent, ContentFetchError> {
        debug!("Extracting content for {url}");

        let body = TavilyExtractRequest {
            urls: [url],
            extract_depth: "advanced",
            format: "markdown",
            include_images: false,
        };

        let response = self
            .client
            .post(TAVILY_EXTRACT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentFetchError::new(url, self.classify(e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentFetchError::new(
                url,
                FetchFailure::Status {
                    status: status.as_u16(),
                    message,
                },
            ));
        }

        let parsed: TavilyExtractResponse = response
            .json()
            .await
            .map_err(|e| ContentFetchError::new(url, FetchFailure::Http(e)))?;

        let content = content_from_response(url, parsed)?;
        info!(
            "Extracted {} words from {} (title: {:?})",
            content.word_count, content.url, content.title
        );
        Ok(content)
    }
}

fn content_from_response(
    url: &str,
    response: TavilyExtractResponse,
) -> Result<ExtractedContent, ContentFetchError> {
    let result = response
        .results
        .into_iter()
        .find(|r| r.raw_content.as_deref().is_some_and(|c| !c.trim().is_empty()));

    match result {
        Some(TavilyResult {
            url: resolved,
            raw_content: Some(raw),
        }) => Ok(ExtractedContent::new(resolved, raw)),
        _ => {
            let reason = response
                .failed_results
                .into_iter()
                .find_map(|f| f.error)
                .unwrap_or_else(|| "extraction returned no content".to_string());
            Err(ContentFetchError::new(url, FetchFailure::NoContent(reason)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher;

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch_content(&self, url: &str) -> Result<ExtractedContent, ContentFetchError> {
            if url.contains("broken") {
                return Err(ContentFetchError::new(
                    url,
                    FetchFailure::NoContent("blocked".to_string()),
                ));
            }
            Ok(ExtractedContent::new(url, format!("# Page {url}\n\nsome body text")))
        }
    }

    /// The failing URL resolves immediately; the other never does.
    struct HangingFetcher {
        started: AtomicUsize,
    }

    #[async_trait]
    impl ContentFetcher for HangingFetcher {
        async fn fetch_content(&self, url: &str) -> Result<ExtractedContent, ContentFetchError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                return Err(ContentFetchError::new(
                    url,
                    FetchFailure::NoContent("blocked".to_string()),
                ));
            }
            std::future::pending().await
        }
    }

    fn parse(json: &str) -> TavilyExtractResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extracted_content_measures_text() {
        let content = ExtractedContent::new("https://a.com", "# Hello There\n\nThree more words");
        assert_eq!(content.title.as_deref(), Some("Hello There"));
        assert_eq!(content.word_count, 5);
    }

    #[test]
    fn test_content_from_response_success() {
        let response = parse(
            r##"{"results": [{"url": "https://a.com/p", "raw_content": "# Title\n\nBody words here", "images": []}],
                "failed_results": [], "response_time": 0.4}"##,
        );
        let content = content_from_response("https://a.com/p", response).unwrap();
        assert_eq!(content.url, "https://a.com/p");
        assert_eq!(content.title.as_deref(), Some("Title"));
        assert_eq!(content.word_count, 4);
    }

    #[test]
    fn test_content_from_response_failed_result_carries_reason() {
        let response = parse(
            r#"{"results": [], "failed_results": [{"url": "https://a.com/p", "error": "403 Forbidden"}]}"#,
        );
        let err = content_from_response("https://a.com/p", response).unwrap_err();
        assert_eq!(err.url, "https://a.com/p");
        match err.failure {
            FetchFailure::NoContent(reason) => assert_eq!(reason, "403 Forbidden"),
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_content_from_response_blank_content_is_no_content() {
        let response = parse(r#"{"results": [{"url": "https://a.com/p", "raw_content": "   "}]}"#);
        let err = content_from_response("https://a.com/p", response).unwrap_err();
        assert!(matches!(err.failure, FetchFailure::NoContent(_)));
        assert!(err.to_string().contains("https://a.com/p"));
    }

    #[tokio::test]
    async fn test_fetch_many_preserves_order() {
        let urls = vec!["https://a.com".to_string(), "https://b.com".to_string()];
        let contents = fetch_content_many(&StaticFetcher, &urls).await.unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].url, "https://a.com");
        assert_eq!(contents[1].url, "https://b.com");
    }

    #[tokio::test]
    async fn test_fetch_many_fails_if_any_fails() {
        let urls = vec!["https://a.com".to_string(), "https://broken.com".to_string()];
        let err = fetch_content_many(&StaticFetcher, &urls).await.unwrap_err();
        assert_eq!(err.url, "https://broken.com");
    }

    #[tokio::test]
    async fn test_fetch_many_is_concurrent_and_fails_fast() {
        let fetcher = HangingFetcher {
            started: AtomicUsize::new(0),
        };
        let urls = vec!["https://slow.com".to_string(), "https://broken.com".to_string()];
        let err = fetch_content_many(&fetcher, &urls).await.unwrap_err();
        assert_eq!(err.url, "https://broken.com");
        assert_eq!(fetcher.started.load(Ordering::SeqCst), 2);
    }
}
