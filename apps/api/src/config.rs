use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,https://ronak232.github.io";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub tavily_api_key: String,
    pub gemini_api_key: String,
    pub groq_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub allowed_origins: AllowedOrigins,
    pub fetch_timeout: Duration,
    pub llm_timeout: Duration,
    pub max_content_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            tavily_api_key: require_env("TAVILY_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            groq_api_key: optional_env("GROQ_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_or("PORT", optional_env("PORT"), 5000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            allowed_origins: parse_origins(
                &optional_env("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            fetch_timeout: Duration::from_secs(parse_or(
                "FETCH_TIMEOUT_SECS",
                optional_env("FETCH_TIMEOUT_SECS"),
                30,
            )?),
            llm_timeout: Duration::from_secs(parse_or(
                "LLM_TIMEOUT_SECS",
                optional_env("LLM_TIMEOUT_SECS"),
                120,
            )?),
            max_content_chars: parse_or(
                "MAX_CONTENT_CHARS",
                optional_env("MAX_CONTENT_CHARS"),
                20_000,
            )?,
        })
    }

    /// CORS policy for the browser client. `*` falls back to a permissive
    /// layer, which cannot carry credentials.
    pub fn cors_layer(&self) -> Result<CorsLayer> {
        let origins = match &self.allowed_origins {
            AllowedOrigins::Any => return Ok(CorsLayer::permissive()),
            AllowedOrigins::List(origins) => origins
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .with_context(|| format!("ALLOWED_ORIGINS entry '{origin}' is not a valid header value"))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true))
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if origins.iter().any(|o| o == "*") {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}
