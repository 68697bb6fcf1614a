/// LLM Client: the single point of entry for all model calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Every provider is an adapter behind `LlmProvider`; the orchestrator only
/// sees the trait and the `ProviderRegistry` built once at startup.
///
/// Calls are never retried here. A provider failure fails the request.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::analysis::model_selector::{ModelConfig, ProviderKind};

pub mod anthropic;
pub mod gemini;
pub mod groq;
pub mod prompts;

pub const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("provider request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("provider '{0}' is not configured")]
    ProviderNotConfigured(ProviderKind),
}

/// Client-side timeouts are kept apart from other transport failures so they
/// surface as timeouts no matter which timer fires first.
impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(error)
        }
    }
}

/// One prompt sent to one model.
#[derive(Debug, Clone, Copy)]
pub struct LlmRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    /// Ask the provider for a JSON-only response, if the model supports it.
    pub json_mode: bool,
    /// Let the provider browse / search on the model's behalf.
    pub web_search: bool,
}

/// Unstructured text returned by a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawModelOutput {
    pub text: String,
    /// Separate reasoning trace, for providers that return one.
    pub reasoning: Option<String>,
}

/// The capability every provider adapter implements.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn invoke(
        &self,
        model: &ModelConfig,
        request: LlmRequest<'_>,
    ) -> Result<RawModelOutput, LlmError>;
}

/// Provider adapters keyed by provider family. Built once in `main`.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ProviderKind, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn LlmProvider>, LlmError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(LlmError::ProviderNotConfigured(kind))
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }
}

/// `{"error": {"message": "..."}}`, shared by all three providers.
#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Turns a non-2xx provider response into `LlmError::Api`.
pub(crate) async fn api_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LlmError::Api {
        status,
        message: error_message(&body),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ProviderErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}
