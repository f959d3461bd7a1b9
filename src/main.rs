//! Podcaster - PDF 转播客服务

use std::sync::Arc;

use podcaster::config::{load_config, print_config, AppConfig};
use podcaster::infrastructure::adapters::{
    ElevenLabsClient, ElevenLabsClientConfig, FakeDocumentStager, FakeScriptGenerator,
    FakeVoiceSynthesizer, FileAudioStorage, GeminiClient, GeminiClientConfig,
    GeminiDocumentStager, TempFileStore,
};
use podcaster::application::WorkflowOptions;
use podcaster::infrastructure::events::EventPublisher;
use podcaster::infrastructure::http::{Adapters, AppState, HttpServer, ServerConfig};
use podcaster::infrastructure::memory::InMemorySessionManager;
use podcaster::infrastructure::worker::{SessionReaper, SessionReaperConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},podcaster={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Podcaster - PDF 转播客服务");
    print_config(&config);

    // 临时文件目录（清理上次遗留的文件）
    let temp_files = Arc::new(TempFileStore::new(&config.storage.temp_dir).await?);
    temp_files.sweep().await?;

    let audio_storage = Arc::new(FileAudioStorage::new(&config.storage.audio_dir).await?);
    let adapters = build_adapters(&config, temp_files)?;

    let default_voice = config
        .workflow
        .voice_profile()
        .ok_or_else(|| anyhow::anyhow!("Unknown default voice: {}", config.workflow.default_voice))?;
    let options = WorkflowOptions {
        mode: config.gemini.generation_mode(),
        require_confirmation: config.workflow.require_confirmation,
        default_voice,
        max_concurrent_runs: config.workflow.max_concurrent_runs,
    };

    let session_manager = Arc::new(InMemorySessionManager::new());
    let event_publisher = Arc::new(EventPublisher::new());

    let state = AppState::new(
        session_manager.clone(),
        audio_storage,
        adapters,
        event_publisher,
        options,
    );

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_upload_size(config.storage.body_limit());
    let server = HttpServer::new(server_config, state);

    // 启动 SessionReaper
    if config.gc.enabled {
        let reaper = SessionReaper::new(
            SessionReaperConfig {
                interval_secs: config.gc.interval_secs,
                session_expire_secs: config.gc.session_expire_secs,
            },
            session_manager,
            server.state().close_session_handler.clone(),
        );
        tokio::spawn(reaper.run());
    }

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 选择外部服务适配器：dry-run 使用离线假实现
fn build_adapters(config: &AppConfig, temp_files: Arc<TempFileStore>) -> anyhow::Result<Adapters> {
    if config.workflow.dry_run {
        tracing::warn!("Dry-run mode: Gemini and ElevenLabs will not be called");
        return Ok(Adapters {
            stager: Arc::new(FakeDocumentStager::new(temp_files)),
            generator: Arc::new(FakeScriptGenerator::sample()),
            synthesizer: Arc::new(FakeVoiceSynthesizer::new()),
        });
    }

    let gemini = Arc::new(GeminiClient::new(
        GeminiClientConfig::new(&config.gemini.api_key)
            .with_base_url(&config.gemini.base_url)
            .with_model(&config.gemini.model)
            .with_timeout(config.gemini.timeout_secs),
    )?);
    let elevenlabs = ElevenLabsClient::new(
        ElevenLabsClientConfig::new(&config.elevenlabs.api_key)
            .with_base_url(&config.elevenlabs.base_url)
            .with_timeout(config.elevenlabs.timeout_secs),
    )?;

    Ok(Adapters {
        stager: Arc::new(GeminiDocumentStager::new(gemini.clone(), temp_files)),
        generator: gemini,
        synthesizer: Arc::new(elevenlabs),
    })
}
