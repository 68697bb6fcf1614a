//! Groq adapter (OpenAI-compatible chat completions).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::model_selector::ModelConfig;
use crate::llm_client::{
    api_error, http_client, LlmError, LlmProvider, LlmRequest, RawModelOutput, MAX_TOKENS,
};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Clone)]
pub struct GroqProvider {
    client: Client,
    api_key: String,
}

impl GroqProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
        })
    }
}

fn request_body(model: &ModelConfig, request: &LlmRequest<'_>) -> Value {
    let mut body = json!({
        "model": model.model_name,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.prompt },
        ],
        "temperature": model.temperature,
        "max_completion_tokens": MAX_TOKENS,
        "stream": false,
    });

    if request.web_search && model.supports_web_search {
        // Built-in browsing; reasoning comes back in its own field.
        body["tools"] = json!([{ "type": "browser_search" }]);
        body["reasoning_format"] = json!("parsed");
    } else if request.json_mode && model.supports_structured_output {
        body["response_format"] = json!({ "type": "json_object" });
    }

    body
}

fn extract_output(response: &Value) -> RawModelOutput {
    let message = &response["choices"][0]["message"];
    RawModelOutput {
        text: message["content"].as_str().unwrap_or_default().to_string(),
        reasoning: message["reasoning"]
            .as_str()
            .filter(|r| !r.trim().is_empty())
            .map(str::to_string),
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn invoke(
        &self,
        model: &ModelConfig,
        request: LlmRequest<'_>,
    ) -> Result<RawModelOutput, LlmError> {
        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body(model, &request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: Value = response.json().await?;
        let usage = parsed.get("usage").unwrap_or(&Value::Null);
        debug!("Groq call succeeded: usage={usage}");

        let output = extract_output(&parsed);
        if output.text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(output)
    }
}
