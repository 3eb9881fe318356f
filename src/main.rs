//! Storyloom - 书籍内容衍生媒体生成服务
//!
//! 启动流程：加载配置 → 初始化日志 → 按配置装配适配器 → 构建功能服务 → 启动 HTTP

use std::sync::Arc;
use std::time::Duration;

use storyloom::application::ports::{
    EmbeddingPort, LlmPort, ObjectStoragePort, TtsEnginePort, VectorSearchPort,
};
use storyloom::application::{RetryPolicy, WorkflowPorts, Workflows};
use storyloom::config::{load_config, print_config, AppConfig, LogConfig, StorageBackend};
use storyloom::infrastructure::adapters::{
    FakeEmbeddingClient, FakeLlmClient, FakeTtsClient, FakeVectorSearch, FallbackTtsEngine,
    GeminiClient, GeminiClientConfig, HttpEmbeddingClient, HttpEmbeddingClientConfig,
    HttpObjectStorage, HttpObjectStorageConfig, HttpTtsClient, HttpTtsClientConfig,
    HttpVectorSearch, HttpVectorSearchConfig, LocalObjectStorage, OpenAiClient,
    OpenAiClientConfig, RoutedLlmClient, SymphoniaAudioProbe,
};
use storyloom::infrastructure::http::{AppState, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Storyloom v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let ports = if config.llm.fake {
        fake_ports(&config)
    } else {
        build_ports(&config).await?
    };

    let workflows = Workflows::new(ports, config.workflow_settings());
    let state = AppState::new(workflows, config.llm.default_model.clone());

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let mut server = HttpServer::new(server_config, state);
    if config.storage.backend == StorageBackend::Local && config.storage.serve_local {
        server = server.with_static_dir("/objects", &config.storage.local_dir);
    }

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志；`RUST_LOG` 优先于配置中的级别
fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},storyloom={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 按配置装配真实的外部服务客户端
async fn build_ports(config: &AppConfig) -> anyhow::Result<WorkflowPorts> {
    // LLM：按模型名路由到 OpenAI 兼容接口或 Gemini
    let mut router = RoutedLlmClient::new(config.llm.retry_policy());
    if config.llm.openai.is_enabled() {
        let client = OpenAiClient::new(OpenAiClientConfig {
            base_url: config.llm.openai.base_url.clone(),
            api_key: config.llm.openai.api_key.clone().unwrap_or_default(),
            timeout_secs: config.llm.timeout_secs,
        })?;
        router = router.with_openai(Arc::new(client));
    }
    if config.llm.gemini.is_enabled() {
        let client = GeminiClient::new(GeminiClientConfig {
            base_url: config.llm.gemini.base_url.clone(),
            api_key: config.llm.gemini.api_key.clone().unwrap_or_default(),
            timeout_secs: config.llm.timeout_secs,
        })?;
        router = router.with_gemini(Arc::new(client));
    }
    if !config.llm.openai.is_enabled() && !config.llm.gemini.is_enabled() {
        tracing::warn!("No LLM provider configured, every LLM call will fail");
    }
    let llm: Arc<dyn LlmPort> = Arc::new(router);

    let search_policy = RetryPolicy::new(2, Duration::from_millis(500));
    let embedding: Arc<dyn EmbeddingPort> = Arc::new(HttpEmbeddingClient::new(
        HttpEmbeddingClientConfig {
            url: config.embedding.url.clone(),
            api_key: config.embedding.api_key.clone(),
            model: config.embedding.model.clone(),
            timeout_secs: config.embedding.timeout_secs,
        },
        search_policy.clone(),
    )?);
    let vector_search: Arc<dyn VectorSearchPort> = Arc::new(HttpVectorSearch::new(
        HttpVectorSearchConfig {
            url: config.vector_search.url.clone(),
            api_key: config.vector_search.api_key.clone(),
            timeout_secs: config.vector_search.timeout_secs,
        },
        search_policy,
    )?);

    // TTS：配置了备用服务时，主服务限流耗尽后切换
    let tts_config = &config.tts;
    let primary = HttpTtsClient::new(
        HttpTtsClientConfig::new(&tts_config.url)
            .with_name("primary")
            .with_api_key(tts_config.api_key.clone())
            .with_timeout(tts_config.timeout_secs)
            .with_retries(tts_config.max_retries, tts_config.base_delay_ms),
    )?;
    let tts: Arc<dyn TtsEnginePort> = match &tts_config.fallback_url {
        Some(url) if !url.trim().is_empty() => {
            let fallback = HttpTtsClient::new(
                HttpTtsClientConfig::new(url)
                    .with_name("fallback")
                    .with_api_key(tts_config.fallback_api_key.clone())
                    .with_timeout(tts_config.timeout_secs)
                    .with_retries(tts_config.max_retries, tts_config.base_delay_ms),
            )?;
            Arc::new(FallbackTtsEngine::new(Arc::new(primary), Arc::new(fallback)))
        }
        _ => Arc::new(primary),
    };

    let storage = build_storage(config).await?;

    Ok(WorkflowPorts {
        llm,
        embedding,
        vector_search,
        tts,
        storage,
        audio_probe: Arc::new(SymphoniaAudioProbe::new()),
    })
}

async fn build_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStoragePort>> {
    let storage = &config.storage;
    let port: Arc<dyn ObjectStoragePort> = match storage.backend {
        StorageBackend::Local => {
            tokio::fs::create_dir_all(&storage.local_dir).await?;
            Arc::new(LocalObjectStorage::new(&storage.local_dir, storage.public_base_url.clone()))
        }
        StorageBackend::Http => Arc::new(HttpObjectStorage::new(HttpObjectStorageConfig {
            endpoint: storage.endpoint.clone(),
            bucket: storage.bucket.clone(),
            access_key: storage.access_key.clone(),
            public_base_url: storage.public_base_url.clone(),
            timeout_secs: storage.timeout_secs,
        })?),
    };
    Ok(port)
}

/// 本地开发用：不访问任何外部服务
fn fake_ports(config: &AppConfig) -> WorkflowPorts {
    tracing::warn!("Running with fake adapters, responses are placeholders");
    WorkflowPorts {
        llm: Arc::new(FakeLlmClient::new().with_default("[]")),
        embedding: Arc::new(FakeEmbeddingClient::new(16)),
        vector_search: Arc::new(FakeVectorSearch::new()),
        tts: Arc::new(FakeTtsClient::new(Vec::new())),
        storage: Arc::new(LocalObjectStorage::new(
            &config.storage.local_dir,
            config.storage.public_base_url.clone(),
        )),
        audio_probe: Arc::new(SymphoniaAudioProbe::new()),
    }
}
