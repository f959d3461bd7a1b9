//! Podcast Context - 播客生成限界上下文
//!
//! 职责:
//! - 上传文档校验
//! - 指令拼接
//! - 脚本文本累积
//! - 运行状态机

mod errors;
mod run_state;
mod value_objects;

pub use errors::PodcastError;
pub use run_state::RunState;
pub use value_objects::{
    ArtifactToken, Instruction, ScriptText, SynthesisParams, UploadedDocument, VoiceSettings,
    BASE_INSTRUCTION, PDF_MEDIA_TYPE,
};
