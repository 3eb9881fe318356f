//! 文本类功能 Handlers：校对、翻译、摘要

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::application::workflows::{OrthographyRequest, SummaryRequest, TranslationRequest};
use crate::infrastructure::http::dto::{
    parse_language, ApiResponse, OrthographyBody, PagesContent, PageSummaryDto, SummaryBody,
    SummaryContent, TranslationBody, WorkflowResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 校对
pub async fn correct_orthography(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OrthographyBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<PagesContent>>>, ApiError> {
    let Json(body) = payload?;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(pages = common.pages.len(), model = %common.model, "Orthography requested");

    let result = state
        .workflows
        .orthography
        .run(OrthographyRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        PagesContent { pages: result.pages },
    ))))
}

/// 翻译
pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslationBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<PagesContent>>>, ApiError> {
    let Json(body) = payload?;
    let target = parse_language(&body.target)?;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(
        pages = common.pages.len(),
        model = %common.model,
        target = %target,
        "Translation requested"
    );

    let result = state
        .workflows
        .translation
        .run(TranslationRequest {
            pages: common.pages,
            model: common.model,
            target,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        PagesContent { pages: result.pages },
    ))))
}

/// 摘要
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummaryBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<SummaryContent>>>, ApiError> {
    let Json(body) = payload?;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(pages = common.pages.len(), model = %common.model, "Summary requested");

    let result = state
        .workflows
        .summary
        .run(SummaryRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        SummaryContent {
            summary: result.summary,
            page_summaries: result.page_summaries.into_iter().map(PageSummaryDto::from).collect(),
        },
    ))))
}
