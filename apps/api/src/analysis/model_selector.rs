//! Model Selector: maps a user-facing model id to a concrete provider + model.
//!
//! Pure lookup over a static table. Unknown or empty ids resolve to the
//! fast, low-cost default instead of failing.

use std::fmt;

/// Upstream LLM provider family. Each has exactly one adapter in `llm_client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    Groq,
    Anthropic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
            ProviderKind::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

/// Immutable model configuration resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model_name: &'static str,
    pub temperature: f32,
    /// Provider offers a JSON response mode for this model.
    pub supports_structured_output: bool,
    /// Provider can browse / search the web on the model's behalf.
    pub supports_web_search: bool,
}

/// Used when the requested id is empty or unknown.
pub const DEFAULT_MODEL: ModelConfig = ModelConfig {
    provider: ProviderKind::Gemini,
    model_name: "gemini-2.0-flash",
    temperature: 0.0,
    supports_structured_output: true,
    supports_web_search: true,
};

const MODEL_TABLE: &[(&[&str], ModelConfig)] = &[
    (
        &["gemini-2.5-flash"],
        ModelConfig {
            provider: ProviderKind::Gemini,
            model_name: "gemini-2.5-flash",
            temperature: 0.0,
            supports_structured_output: true,
            supports_web_search: true,
        },
    ),
    (
        &["gemini-2.5-pro"],
        ModelConfig {
            provider: ProviderKind::Gemini,
            model_name: "gemini-2.5-pro",
            temperature: 0.0,
            supports_structured_output: true,
            supports_web_search: true,
        },
    ),
    (
        &["Meta-llama-4"],
        ModelConfig {
            provider: ProviderKind::Groq,
            model_name: "meta-llama/llama-4-maverick-17b-128e-instruct",
            temperature: 0.0,
            supports_structured_output: true,
            supports_web_search: false,
        },
    ),
    (
        &["Moonshot-kimi", "Moonshot-kimi-k2"],
        ModelConfig {
            provider: ProviderKind::Groq,
            model_name: "moonshotai/kimi-k2-instruct",
            temperature: 0.0,
            supports_structured_output: true,
            supports_web_search: false,
        },
    ),
    (
        &["openai/gpt-oss-120b"],
        ModelConfig {
            provider: ProviderKind::Groq,
            model_name: "openai/gpt-oss-120b",
            temperature: 1.0,
            supports_structured_output: false,
            supports_web_search: true,
        },
    ),
    (
        &["claude-sonnet-4-5"],
        ModelConfig {
            provider: ProviderKind::Anthropic,
            model_name: "claude-sonnet-4-5",
            temperature: 0.0,
            supports_structured_output: false,
            supports_web_search: false,
        },
    ),
];

/// Resolves a model id (table key or concrete model name) to its config.
pub fn resolve_model(model_id: &str) -> ModelConfig {
    let id = model_id.trim();
    if id.is_empty() {
        return DEFAULT_MODEL;
    }

    MODEL_TABLE
        .iter()
        .find(|(keys, config)| keys.iter().any(|key| *key == id) || config.model_name == id)
        .map(|(_, config)| *config)
        .unwrap_or(DEFAULT_MODEL)
}
