//! Google Gemini `generateContent` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::model_selector::ModelConfig;
use crate::llm_client::{
    api_error, http_client, LlmError, LlmProvider, LlmRequest, RawModelOutput, MAX_TOKENS,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
        })
    }
}

fn request_body(model: &ModelConfig, request: &LlmRequest<'_>) -> Value {
    let mut generation_config = json!({
        "temperature": model.temperature,
        "maxOutputTokens": MAX_TOKENS,
    });

    let mut body = json!({
        "system_instruction": { "parts": [{ "text": request.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
    });

    // Gemini rejects a JSON mime type combined with grounding tools.
    if request.web_search && model.supports_web_search {
        body["tools"] = json!([{ "url_context": {} }, { "google_search": {} }]);
    } else if request.json_mode && model.supports_structured_output {
        generation_config["responseMimeType"] = json!("application/json");
    }

    body["generationConfig"] = generation_config;
    body
}

/// Joins the text parts of the first candidate.
fn extract_text(response: &Value) -> String {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn invoke(
        &self,
        model: &ModelConfig,
        request: LlmRequest<'_>,
    ) -> Result<RawModelOutput, LlmError> {
        let url = format!("{GEMINI_API_BASE}/models/{}:generateContent", model.model_name);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(model, &request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: Value = response.json().await?;
        let usage = parsed.get("usageMetadata").unwrap_or(&Value::Null);
        debug!("Gemini call succeeded: usage={usage}");

        let text = extract_text(&parsed);
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        Ok(RawModelOutput {
            text,
            reasoning: None,
        })
    }
}
