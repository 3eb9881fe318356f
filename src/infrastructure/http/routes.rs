//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                    GET   健康检查
//! - /api/orthography/correct     POST  校对
//! - /api/quiz/generate           POST  生成测验题
//! - /api/lyrics/generate         POST  生成歌词
//! - /api/play/generate           POST  生成剧本
//! - /api/translation/translate   POST  翻译
//! - /api/summary/generate        POST  摘要
//! - /api/sound/generate          POST  背景音乐与音效

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/orthography/correct", post(handlers::correct_orthography))
        .route("/quiz/generate", post(handlers::generate_quiz))
        .route("/lyrics/generate", post(handlers::generate_lyrics))
        .route("/play/generate", post(handlers::generate_play))
        .route("/translation/translate", post(handlers::translate))
        .route("/summary/generate", post(handlers::summarize))
        .route("/sound/generate", post(handlers::generate_sound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::application::ports::LlmError;
    use crate::application::{WorkflowPorts, WorkflowSettings, Workflows};
    use crate::infrastructure::adapters::{
        FakeEmbeddingClient, FakeLlmClient, FakeTtsClient, FakeVectorSearch, LocalObjectStorage,
        SymphoniaAudioProbe,
    };

    fn app(llm: FakeLlmClient, dir: &tempfile::TempDir) -> Router {
        let ports = WorkflowPorts {
            llm: Arc::new(llm),
            embedding: Arc::new(FakeEmbeddingClient::new(8)),
            vector_search: Arc::new(FakeVectorSearch::new()),
            tts: Arc::new(FakeTtsClient::new(b"audio".to_vec())),
            storage: Arc::new(LocalObjectStorage::new(dir.path(), "http://cdn.local")),
            audio_probe: Arc::new(SymphoniaAudioProbe::new()),
        };
        let workflows = Workflows::new(ports, WorkflowSettings::default());
        create_routes().with_state(Arc::new(AppState::new(workflows, "gpt-4o-mini")))
    }

    async fn post_json(app: Router, uri: &str, body: String) -> Value {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn one_page(language: &str) -> Value {
        json!({
            "pages": [{"pageKey": 1, "texts": [{"text": "The cat sat on teh mat."}]}],
            "language": language,
        })
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(FakeLlmClient::new(), &dir)
            .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_orthography_completed() {
        let dir = tempfile::tempdir().unwrap();
        let llm = FakeLlmClient::new().on("Correct spelling", r#"["The cat sat on the mat."]"#);

        let json = post_json(app(llm, &dir), "/api/orthography/correct", one_page("en").to_string()).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["state"], "Completed");
        assert_eq!(json["data"]["language"], "en");
        assert_eq!(json["data"]["pages"][0]["pageKey"], 1);
        assert_eq!(json["data"]["pages"][0]["texts"][0]["text"], "The cat sat on the mat.");
        assert!(json["data"]["execution_time"].as_str().unwrap().ends_with('s'));
    }

    #[tokio::test]
    async fn test_workflow_failure_is_incompleted_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let llm = FakeLlmClient::new().fail_on(
            "quiz questions",
            LlmError::ServiceError {
                status: 400,
                message: "bad request".into(),
            },
        );

        let mut body = one_page("en");
        body["count"] = json!(2);
        let json = post_json(app(llm, &dir), "/api/quiz/generate", body.to_string()).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["state"], "Incompleted");
        assert!(json["data"]["error"].is_string());
        assert!(json["data"]["quizzes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_requests_are_bad_request() {
        let dir = tempfile::tempdir().unwrap();

        let empty = post_json(app(FakeLlmClient::new(), &dir), "/api/summary/generate", r#"{"pages": []}"#.into()).await;
        assert_eq!(empty["errno"], 400);
        assert!(empty["data"].is_null());

        let mut body = one_page("en");
        body["problemTypes"] = json!([1]);
        let invalid_type = post_json(app(FakeLlmClient::new(), &dir), "/api/quiz/generate", body.to_string()).await;
        assert_eq!(invalid_type["errno"], 400);

        let mut body = one_page("en");
        body["count"] = json!(1_000_000_000_000u64);
        let too_many = post_json(app(FakeLlmClient::new(), &dir), "/api/quiz/generate", body.to_string()).await;
        assert_eq!(too_many["errno"], 400);

        let mut body = one_page("en");
        body["target"] = json!("tlh");
        let unknown_target =
            post_json(app(FakeLlmClient::new(), &dir), "/api/translation/translate", body.to_string()).await;
        assert_eq!(unknown_target["errno"], 400);

        let garbage = post_json(app(FakeLlmClient::new(), &dir), "/api/play/generate", "{not json".into()).await;
        assert_eq!(garbage["errno"], 400);
    }

    #[tokio::test]
    async fn test_translation_route() {
        let dir = tempfile::tempdir().unwrap();
        let llm = FakeLlmClient::new().on("Translate every string", r#"["고양이가 매트 위에 앉았다."]"#);

        let mut body = one_page("en");
        body["target"] = json!("ko");
        let json = post_json(app(llm, &dir), "/api/translation/translate", body.to_string()).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["state"], "Completed");
        assert_eq!(json["data"]["language"], "ko");
        assert_eq!(json["data"]["pages"][0]["texts"][0]["text"], "고양이가 매트 위에 앉았다.");
    }
}
