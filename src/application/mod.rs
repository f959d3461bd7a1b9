//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（文档暂存、脚本生成、语音合成、音频存储、会话管理）
//! - commands: CQRS 命令及处理器（含播客工作流）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Session commands
    CloseSessionCommand,
    CloseSessionResponse,
    CreateSessionCommand,
    CreateSessionResponse,
    DownloadAudioCommand,
    DownloadedAudio,
    SaveAddendumCommand,
    UploadDocumentCommand,
    UploadDocumentResponse,
    // Run commands
    ConfirmSynthesisCommand,
    ExecuteRunCommand,
    RunOutcome,
    // Handlers
    handlers::{
        CloseSessionHandler, CreateSessionHandler, DownloadAudioHandler, ExecuteRunHandler,
        PodcastWorkflow, SaveAddendumHandler, UploadDocumentHandler, WorkflowOptions,
        DOWNLOAD_FILE_NAME,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio storage
    AudioArtifact,
    AudioStorageError,
    AudioStoragePort,
    // Document stager
    DocumentHandle,
    DocumentStagerPort,
    StagingError,
    // Events
    RunEventSink,
    // Script generator
    FragmentStream,
    GenerationError,
    GenerationMode,
    GenerationRequest,
    ScriptGeneratorPort,
    // Session manager
    RunContext,
    Session,
    SessionError,
    SessionManagerPort,
    // Voice synthesizer
    AudioChunkStream,
    SynthesisError,
    SynthesisRequest,
    VoiceSynthesizerPort,
};

pub use queries::{
    // Audio queries
    GetAudioQuery,
    // Session queries
    GetSessionStatus,
    SessionStatus,
    // Voice queries
    ListVoices,
    VoiceOption,
    // Handlers
    handlers::{GetAudioHandler, GetSessionStatusHandler, ListVoicesHandler},
};
