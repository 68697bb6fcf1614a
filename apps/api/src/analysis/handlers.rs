//! Axum route handlers for the Analysis API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::orchestrator::{AnalysisOutput, AnalysisRequest};
use crate::analysis::schema::{AuditResult, ComparisonResult};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadRequest {
    pub user_url: String,
    pub competitor_url: String,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub web_search_model: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: ComparisonResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub response_data: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Bad JSON becomes a 400 in the usual error shape instead of axum's plain-text rejection.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn unexpected_output(mode: &str, output: &AnalysisOutput) -> AppError {
    AppError::Internal(anyhow::anyhow!("unexpected output for {mode}: {output:?}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/upload
///
/// Compares the user's page against a competitor's page.
pub async fn handle_upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let request = body(payload)?;
    let request = AnalysisRequest::comparison(
        &request.user_url,
        &request.competitor_url,
        request.model.as_deref(),
    )?;

    // Shutdown cancels this; a client disconnect drops the whole future instead.
    let cancel = state.shutdown.child_token();

    let message = match state.orchestrator.run(request, &cancel).await? {
        AnalysisOutput::Comparison(result) => result,
        other => return Err(unexpected_output("comparison", &other)),
    };

    Ok(Json(UploadResponse { message }))
}

/// POST /api/v1/analyze
///
/// Single-page audit driven by a free-text prompt that names the URL.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = body(payload)?;
    let request = AnalysisRequest::audit(&request.prompt, request.web_search_model.as_deref())?;

    let cancel = state.shutdown.child_token();

    let (response_data, reasoning) = match state.orchestrator.run(request, &cancel).await? {
        AnalysisOutput::Audit { result, reasoning } => (result, reasoning),
        other => return Err(unexpected_output("audit", &other)),
    };

    Ok(Json(AnalyzeResponse {
        response_data,
        reasoning,
    }))
}
