//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_storage;
mod document_stager;
mod run_events;
mod script_generator;
mod session_manager;
mod voice_synthesizer;

pub use audio_storage::{AudioArtifact, AudioStorageError, AudioStoragePort};
pub use document_stager::{DocumentHandle, DocumentStagerPort, StagingError};
pub use run_events::RunEventSink;
pub use script_generator::{
    FragmentStream, GenerationError, GenerationMode, GenerationRequest, ScriptGeneratorPort,
};
pub use session_manager::{RunContext, Session, SessionError, SessionManagerPort};
pub use voice_synthesizer::{
    AudioChunkStream, SynthesisError, SynthesisRequest, VoiceSynthesizerPort,
};
