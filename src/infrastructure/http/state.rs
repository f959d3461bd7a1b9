//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloseSessionHandler, CreateSessionHandler, DownloadAudioHandler, ExecuteRunHandler,
    PodcastWorkflow, SaveAddendumHandler, UploadDocumentHandler, WorkflowOptions,
    // Query handlers
    GetAudioHandler, GetSessionStatusHandler, ListVoicesHandler,
    // Ports
    AudioStoragePort, DocumentStagerPort, RunEventSink, ScriptGeneratorPort, SessionManagerPort,
    VoiceSynthesizerPort,
};
use crate::infrastructure::events::EventPublisher;

/// 外部服务适配器（真实或 dry-run）
pub struct Adapters {
    pub stager: Arc<dyn DocumentStagerPort>,
    pub generator: Arc<dyn ScriptGeneratorPort>,
    pub synthesizer: Arc<dyn VoiceSynthesizerPort>,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub audio_storage: Arc<dyn AudioStoragePort>,
    pub event_publisher: Arc<EventPublisher>,

    /// 后台执行运行
    pub workflow: Arc<PodcastWorkflow>,

    // ========== Command Handlers ==========
    pub create_session_handler: CreateSessionHandler,
    pub upload_document_handler: UploadDocumentHandler,
    pub save_addendum_handler: SaveAddendumHandler,
    pub close_session_handler: Arc<CloseSessionHandler>,
    pub execute_run_handler: ExecuteRunHandler,
    pub download_audio_handler: DownloadAudioHandler,

    // ========== Query Handlers ==========
    pub session_status_handler: GetSessionStatusHandler,
    pub list_voices_handler: ListVoicesHandler,
    pub get_audio_handler: GetAudioHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        adapters: Adapters,
        event_publisher: Arc<EventPublisher>,
        options: WorkflowOptions,
    ) -> Self {
        let events: Arc<dyn RunEventSink> = event_publisher.clone();

        let workflow = Arc::new(PodcastWorkflow::new(
            session_manager.clone(),
            adapters.stager,
            adapters.generator,
            adapters.synthesizer,
            audio_storage.clone(),
            events.clone(),
            &options,
        ));

        Self {
            // Ports
            session_manager: session_manager.clone(),
            audio_storage: audio_storage.clone(),
            event_publisher,
            workflow,

            // Command handlers
            create_session_handler: CreateSessionHandler::new(session_manager.clone()),
            upload_document_handler: UploadDocumentHandler::new(
                session_manager.clone(),
                audio_storage.clone(),
                events.clone(),
            ),
            save_addendum_handler: SaveAddendumHandler::new(session_manager.clone()),
            close_session_handler: Arc::new(CloseSessionHandler::new(
                session_manager.clone(),
                audio_storage.clone(),
                events.clone(),
            )),
            execute_run_handler: ExecuteRunHandler::new(
                session_manager.clone(),
                audio_storage.clone(),
                events.clone(),
                options.clone(),
            ),
            download_audio_handler: DownloadAudioHandler::new(
                session_manager.clone(),
                audio_storage.clone(),
                events,
            ),

            // Query handlers
            session_status_handler: GetSessionStatusHandler::new(session_manager.clone()),
            list_voices_handler: ListVoicesHandler::new(options.default_voice),
            get_audio_handler: GetAudioHandler::new(session_manager, audio_storage),
        }
    }
}
