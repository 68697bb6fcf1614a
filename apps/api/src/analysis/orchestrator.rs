//! Analysis Orchestrator: sequences one request end to end.
//!
//! Comparison: Idle → Fetching → Prompting → Parsing → Validating → Done
//! Audit:      Idle → Prompting → Parsing → Validating → Done
//!
//! Any failure moves to `Failed` and ends the request; nothing is retried and
//! no partial result is returned. Every external call is bounded by its own
//! timeout and races the caller's cancellation token; the HTTP handlers pass
//! a child of the server's shutdown token. A client disconnect drops the
//! whole future instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use crate::analysis::fetcher::{fetch_content_many, ContentFetcher, ExtractedContent};
use crate::analysis::model_selector::{resolve_model, ModelConfig};
use crate::analysis::parser::{extract_json, unwrap_envelope};
use crate::analysis::prompts::{
    render, AUDIT_SYSTEM, COMPARISON_PROMPT_TEMPLATE, COMPARISON_SYSTEM,
};
use crate::analysis::schema::{AuditResult, ComparisonResult, AUDIT_SCHEMA, COMPARISON_SCHEMA};
use crate::analysis::text_stats::truncate_content;
use crate::errors::AppError;
use crate::llm_client::prompts::{COMPLETE_OBJECT_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmRequest, ProviderRegistry, RawModelOutput};

// ────────────────────────────────────────────────────────────────────────────
// Request / output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    SingleAudit,
    Comparison,
}

/// A validated analysis request. Construct through `comparison` / `audit`.
/// URLs keep the client's spelling (trimmed) so errors report what was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Comparison {
        user_url: String,
        competitor_url: String,
        model_id: String,
    },
    Audit {
        prompt: String,
        model_id: String,
    },
}

impl AnalysisRequest {
    pub fn comparison(
        user_url: &str,
        competitor_url: &str,
        model_id: Option<&str>,
    ) -> Result<Self, AppError> {
        Ok(AnalysisRequest::Comparison {
            user_url: parse_page_url("userUrl", user_url)?,
            competitor_url: parse_page_url("competitorUrl", competitor_url)?,
            model_id: model_id.unwrap_or_default().trim().to_string(),
        })
    }

    pub fn audit(prompt: &str, model_id: Option<&str>) -> Result<Self, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt is required".to_string()));
        }
        Ok(AnalysisRequest::Audit {
            prompt: prompt.trim().to_string(),
            model_id: model_id.unwrap_or_default().trim().to_string(),
        })
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            AnalysisRequest::Comparison { .. } => AnalysisMode::Comparison,
            AnalysisRequest::Audit { .. } => AnalysisMode::SingleAudit,
        }
    }

    pub fn model_id(&self) -> &str {
        match self {
            AnalysisRequest::Comparison { model_id, .. } | AnalysisRequest::Audit { model_id, .. } => {
                model_id
            }
        }
    }
}

fn parse_page_url(field: &str, raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }

    let url = Url::parse(raw).map_err(|e| AppError::Validation(format!("{field} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Validation(format!(
            "{field} must be an absolute http(s) URL"
        )));
    }
    Ok(raw.to_string())
}

/// First http(s) URL mentioned in free text, if any.
pub fn first_url(text: &str) -> Option<Url> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| matches!(c, '(' | ')' | '<' | '>' | '"' | '\'' | ',')))
        .filter_map(|token| Url::parse(token).ok())
        .find(|url| matches!(url.scheme(), "http" | "https"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutput {
    Comparison(ComparisonResult),
    Audit {
        result: AuditResult,
        reasoning: Option<String>,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// State tracking
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Prompting,
    Parsing,
    Validating,
    Done,
    Failed,
}

/// Records the stages a request passed through; `Done` and `Failed` are terminal.
#[derive(Debug)]
struct StageTracker {
    history: Vec<Stage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            history: vec![Stage::Idle],
        }
    }

    fn current(&self) -> Stage {
        self.history.last().copied().unwrap_or(Stage::Idle)
    }

    fn advance(&mut self, next: Stage) {
        let current = self.current();
        if matches!(current, Stage::Done | Stage::Failed) {
            return;
        }
        debug!("stage {current:?} -> {next:?}");
        self.history.push(next);
    }

    fn finish<T>(&mut self, result: &Result<T, AppError>) {
        match result {
            Ok(_) => self.advance(Stage::Done),
            Err(e) => {
                warn!("analysis failed during {:?}: {e}", self.current());
                self.advance(Stage::Failed);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub fetch: Duration,
    pub model: Duration,
}

/// Everything a request needs, injected once at startup.
pub struct Orchestrator {
    fetcher: Arc<dyn ContentFetcher>,
    providers: ProviderRegistry,
    timeouts: Timeouts,
    max_content_chars: usize,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        providers: ProviderRegistry,
        timeouts: Timeouts,
        max_content_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            providers,
            timeouts,
            max_content_chars,
        }
    }

    /// Runs one request inside its own tracing span.
    pub async fn run(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutput, AppError> {
        let span = info_span!(
            "analysis",
            request_id = %Uuid::new_v4(),
            mode = ?request.mode(),
            model = %request.model_id(),
        );

        async move {
            match request {
                AnalysisRequest::Comparison {
                    user_url,
                    competitor_url,
                    model_id,
                } => self
                    .run_comparison(&user_url, &competitor_url, &model_id, cancel)
                    .await
                    .map(AnalysisOutput::Comparison),
                AnalysisRequest::Audit { prompt, model_id } => self
                    .run_audit(&prompt, &model_id, cancel)
                    .await
                    .map(|(result, reasoning)| AnalysisOutput::Audit { result, reasoning }),
            }
        }
        .instrument(span)
        .await
    }

    /// Two-URL competitive comparison.
    pub async fn run_comparison(
        &self,
        user_url: &str,
        competitor_url: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ComparisonResult, AppError> {
        let mut stages = StageTracker::new();
        let result = self
            .comparison_steps(&mut stages, user_url, competitor_url, model_id, cancel)
            .await;
        stages.finish(&result);
        result
    }

    async fn comparison_steps(
        &self,
        stages: &mut StageTracker,
        user_url: &str,
        competitor_url: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ComparisonResult, AppError> {
        let model = resolve_model(model_id);
        info!(
            "Comparing {user_url} with {competitor_url} using {}/{}",
            model.provider, model.model_name
        );

        stages.advance(Stage::Fetching);
        let urls = [user_url.to_string(), competitor_url.to_string()];
        let contents = bounded("content fetch", self.timeouts.fetch, cancel, async {
            fetch_content_many(self.fetcher.as_ref(), &urls)
                .await
                .map_err(AppError::from)
        })
        .await?;
        let [user_page, competitor_page] = <[ExtractedContent; 2]>::try_from(contents)
            .map_err(|got| {
                AppError::Internal(anyhow::anyhow!(
                    "expected 2 extracted pages, got {}",
                    got.len()
                ))
            })?;

        stages.advance(Stage::Prompting);
        let prompt = self.comparison_prompt(&user_page, &competitor_page);
        let system = format!("{COMPARISON_SYSTEM} {JSON_ONLY_SYSTEM}");
        let output = self
            .invoke(
                &model,
                LlmRequest {
                    system: &system,
                    prompt: &prompt,
                    json_mode: true,
                    web_search: false,
                },
                cancel,
            )
            .await?;

        stages.advance(Stage::Parsing);
        let candidate = unwrap_envelope(
            extract_json(&output.text),
            &COMPARISON_SCHEMA.field_names(),
        );

        stages.advance(Stage::Validating);
        let mut result = ComparisonResult::from_candidate(&candidate)?;
        apply_measurements(&mut result, &user_page, &competitor_page);

        info!(
            "Comparison done: {} missing, {} suggested keywords",
            result.missing_keywords.len(),
            result.suggested_keywords.len()
        );
        Ok(result)
    }

    fn comparison_prompt(&self, user_page: &ExtractedContent, competitor_page: &ExtractedContent) -> String {
        let url1_content = truncate_content(&user_page.raw_text, self.max_content_chars);
        let url2_content = truncate_content(&competitor_page.raw_text, self.max_content_chars);
        let url1_word_count = user_page.word_count.to_string();
        let url2_word_count = competitor_page.word_count.to_string();

        let body = render(
            COMPARISON_PROMPT_TEMPLATE,
            &[
                ("user_url", user_page.url.as_str()),
                ("competitor_url", competitor_page.url.as_str()),
                ("url1_content", &url1_content),
                ("url2_content", &url2_content),
                ("url1_word_count", &url1_word_count),
                ("url2_word_count", &url2_word_count),
            ],
        );
        format!("{body}\n\n{COMPLETE_OBJECT_INSTRUCTION}")
    }

    /// Single-URL audit. The user's prompt goes to the model as-is; models
    /// with hosted browsing resolve the URL themselves.
    pub async fn run_audit(
        &self,
        prompt: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(AuditResult, Option<String>), AppError> {
        let mut stages = StageTracker::new();
        let result = self.audit_steps(&mut stages, prompt, model_id, cancel).await;
        stages.finish(&result);
        result
    }

    async fn audit_steps(
        &self,
        stages: &mut StageTracker,
        prompt: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(AuditResult, Option<String>), AppError> {
        let model = resolve_model(model_id);
        match first_url(prompt) {
            Some(url) => info!("Auditing {url} using {}/{}", model.provider, model.model_name),
            None => warn!("Audit prompt names no URL; sending it to the model anyway"),
        }

        stages.advance(Stage::Prompting);
        let system = format!("{AUDIT_SYSTEM}\n\n{JSON_ONLY_SYSTEM} {COMPLETE_OBJECT_INSTRUCTION}");
        let output = self
            .invoke(
                &model,
                LlmRequest {
                    system: &system,
                    prompt,
                    json_mode: true,
                    web_search: true,
                },
                cancel,
            )
            .await?;

        stages.advance(Stage::Parsing);
        let candidate = unwrap_envelope(extract_json(&output.text), &AUDIT_SCHEMA.field_names());

        stages.advance(Stage::Validating);
        let result = AuditResult::from_candidate(&candidate)?;

        info!(
            "Audit done: overall={} keywords={} quality={}",
            result.overall_seo_score, result.keyword_usage_score, result.content_quality_score
        );
        Ok((result, output.reasoning))
    }

    async fn invoke(
        &self,
        model: &ModelConfig,
        request: LlmRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<RawModelOutput, AppError> {
        let provider = self.providers.get(model.provider)?;
        bounded("model call", self.timeouts.model, cancel, async {
            provider.invoke(model, request).await.map_err(AppError::from)
        })
        .await
    }
}

/// Word counts are measured locally, never taken from the model. Titles fall
/// back to the extracted ones when the model left them blank.
fn apply_measurements(
    result: &mut ComparisonResult,
    user_page: &ExtractedContent,
    competitor_page: &ExtractedContent,
) {
    result.word_count_comparison.url1_word_count = user_page.word_count;
    result.word_count_comparison.url2_word_count = competitor_page.word_count;

    let titles = &mut result.meta_info_comparison;
    if titles.url1_title.trim().is_empty() {
        titles.url1_title = user_page.title.clone().unwrap_or_default();
    }
    if titles.url2_title.trim().is_empty() {
        titles.url2_title = competitor_page.title.clone().unwrap_or_default();
    }
}

/// Races `fut` against its timeout and the cancellation token.
async fn bounded<T, F>(
    what: &str,
    limit: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        outcome = tokio::time::timeout(limit, fut) => outcome.unwrap_or_else(|_| {
            Err(AppError::Timeout(format!("{what} exceeded {}s", limit.as_secs())))
        }),
    }
}
