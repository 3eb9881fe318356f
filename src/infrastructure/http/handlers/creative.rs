//! 创作类功能 Handlers：测验题、歌词、剧本

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::application::workflows::{LyricsRequest, PlayRequest, QuizRequest};
use crate::infrastructure::http::dto::{
    ApiResponse, LyricsBody, LyricsContent, PlayBody, PlayContent, QuizBody, QuizContent,
    WorkflowResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 生成测验题
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuizBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<QuizContent>>>, ApiError> {
    let Json(body) = payload?;
    let count = body.count(state.workflows.settings.quiz_default_count)?;
    let problem_types = body.problem_types()?;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(
        pages = common.pages.len(),
        model = %common.model,
        count,
        problem_types = ?problem_types,
        "Quiz requested"
    );

    let result = state
        .workflows
        .quiz
        .run(QuizRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
            count,
            problem_types,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        QuizContent {
            quizzes: result.quizzes,
        },
    ))))
}

/// 生成歌词
pub async fn generate_lyrics(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LyricsBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<LyricsContent>>>, ApiError> {
    let Json(body) = payload?;
    let genre = body.genre.filter(|g| !g.trim().is_empty());
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(pages = common.pages.len(), model = %common.model, genre = ?genre, "Lyrics requested");

    let result = state
        .workflows
        .lyrics
        .run(LyricsRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
            genre,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        LyricsContent {
            lyrics: result.lyrics,
        },
    ))))
}

/// 生成剧本
pub async fn generate_play(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlayBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<PlayContent>>>, ApiError> {
    let Json(body) = payload?;
    if body.speaker_count == 0 {
        return Err(ApiError::BadRequest("speakerCount must be at least 1".to_string()));
    }
    let speaker_count = body.speaker_count;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(
        pages = common.pages.len(),
        model = %common.model,
        speaker_count,
        "Play script requested"
    );

    let result = state
        .workflows
        .play
        .run(PlayRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
            speaker_count,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        PlayContent::new(result.script, result.attempts),
    ))))
}
