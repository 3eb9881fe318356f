//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::info;

use super::middleware::request_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
    /// (路由前缀, 目录)：本地对象存储的静态文件服务
    static_dir: Option<(String, PathBuf)>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
            static_dir: None,
        }
    }

    /// 在 `route` 下托管 `dir` 中的文件
    pub fn with_static_dir(mut self, route: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some((route.into(), dir.into()));
        self
    }

    /// 构建 Router
    pub fn build_router(&self) -> Router {
        // CORS 配置 - 允许所有来源的跨域请求
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        let mut router = create_routes();
        if let Some((route, dir)) = &self.static_dir {
            info!("Serving {:?} at {}", dir, route);
            router = router.nest_service(route, ServeDir::new(dir));
        }

        // 整本书的页面 JSON 可能较大，请求体上限 50MB
        router
            .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::application::{WorkflowPorts, WorkflowSettings, Workflows};
    use crate::infrastructure::adapters::{
        FakeEmbeddingClient, FakeLlmClient, FakeTtsClient, FakeVectorSearch, LocalObjectStorage,
        SymphoniaAudioProbe,
    };

    fn server(dir: &tempfile::TempDir) -> HttpServer {
        let ports = WorkflowPorts {
            llm: Arc::new(FakeLlmClient::new()),
            embedding: Arc::new(FakeEmbeddingClient::new(4)),
            vector_search: Arc::new(FakeVectorSearch::new()),
            tts: Arc::new(FakeTtsClient::new(Vec::new())),
            storage: Arc::new(LocalObjectStorage::new(dir.path(), "http://localhost:8000/objects")),
            audio_probe: Arc::new(SymphoniaAudioProbe::new()),
        };
        let state = AppState::new(Workflows::new(ports, WorkflowSettings::default()), "m");
        HttpServer::new(ServerConfig::default(), state)
    }

    #[tokio::test]
    async fn test_serves_local_objects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sound/music")).unwrap();
        std::fs::write(dir.path().join("sound/music/a.mp3"), b"ID3").unwrap();

        let router = server(&dir).with_static_dir("/objects", dir.path()).build_router();
        let response = router
            .oneshot(Request::builder().uri("/objects/sound/music/a.mp3").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ID3");
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(&dir)
            .build_router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/quiz/generate")
                    .header("origin", "http://example.com")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
