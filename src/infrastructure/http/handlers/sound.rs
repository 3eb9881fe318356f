//! 音效功能 Handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::application::workflows::SoundRequest;
use crate::infrastructure::http::dto::{ApiResponse, SoundBody, SoundContent, WorkflowResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 选择背景音乐与音效，可选生成音频
pub async fn generate_sound(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SoundBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResponse<SoundContent>>>, ApiError> {
    let Json(body) = payload?;
    let generate_audio = body.generate_audio;
    let common = body.common.resolve(&state.default_model)?;

    tracing::info!(
        pages = common.pages.len(),
        model = %common.model,
        generate_audio,
        "Sound requested"
    );

    let result = state
        .workflows
        .sound
        .run(SoundRequest {
            pages: common.pages,
            model: common.model,
            language: common.language,
            generate_audio,
        })
        .await;

    Ok(Json(ApiResponse::success(WorkflowResponse::new(
        result.report,
        SoundContent {
            background_music: result.background_music,
            sound_effects: result.sound_effects,
        },
    ))))
}
