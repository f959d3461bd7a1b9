//! Session Manager Port - 会话生命周期管理
//!
//! 定义会话管理的抽象接口，具体实现在 infrastructure/memory 层
//!
//! 每个会话同一时间只有一次运行；运行所需的全部输入在开始时
//! 固化进 `RunContext`，之后不再读取会话里的可变字段

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::{AudioArtifact, GenerationMode};
use crate::domain::podcast::{
    ArtifactToken, Instruction, RunState, ScriptText, UploadedDocument,
};
use crate::domain::voice::VoiceProfile;

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Session {session_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        session_id: String,
        from: RunState,
        to: RunState,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// 单次运行的上下文（开始后不可变）
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub session_id: String,
    pub document: UploadedDocument,
    pub instruction: Instruction,
    pub voice: VoiceProfile,
    pub mode: GenerationMode,
}

impl RunContext {
    pub fn new(
        session_id: impl Into<String>,
        document: UploadedDocument,
        instruction: Instruction,
        voice: VoiceProfile,
        mode: GenerationMode,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            session_id: session_id.into(),
            document,
            instruction,
            voice,
            mode,
        }
    }
}

/// 会话状态（in-memory）
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub state: RunState,
    /// 当前上传的文档
    pub document: Option<UploadedDocument>,
    /// 用户保存的指令追加内容
    pub addendum: Option<String>,
    /// 当前（或最近一次）运行
    pub run: Option<RunContext>,
    /// 当前运行已收到的脚本
    pub script: ScriptText,
    pub artifact: Option<AudioArtifact>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            state: RunState::Idle,
            document: None,
            addendum: None,
            run: None,
            script: ScriptText::new(),
            artifact: None,
            error: None,
            created_at: now,
            last_activity: now,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session Manager Port
///
/// 管理会话与运行状态，所有状态存储在内存中。
/// 所有状态变化都经过 `RunState::can_transition_to` 校验
pub trait SessionManagerPort: Send + Sync {
    /// 创建新会话
    fn create(&self, session: Session) -> Result<String, SessionError>;

    /// 获取会话快照
    fn get(&self, id: &str) -> Result<Session, SessionError>;

    /// 上传文档（→ DocumentUploaded），丢弃上一次运行的脚本和错误
    ///
    /// 返回被替换下来的音频产物，由调用方删除
    fn attach_document(
        &self,
        id: &str,
        document: UploadedDocument,
    ) -> Result<Option<AudioArtifact>, SessionError>;

    /// 保存指令追加内容
    fn save_addendum(&self, id: &str, addendum: Option<String>) -> Result<(), SessionError>;

    /// 开始运行（→ Generating），清空脚本
    ///
    /// 返回上一次运行遗留的音频产物，由调用方删除
    fn begin_run(&self, id: &str, run: RunContext) -> Result<Option<AudioArtifact>, SessionError>;

    /// 状态迁移
    fn transition(&self, id: &str, state: RunState) -> Result<(), SessionError>;

    /// 追加脚本片段，返回片段序号
    fn append_fragment(&self, id: &str, fragment: &str) -> Result<usize, SessionError>;

    /// 登记音频产物（→ AudioReady）
    fn complete_audio(&self, id: &str, artifact: AudioArtifact) -> Result<(), SessionError>;

    /// 运行失败（→ Failed），保留已收到的脚本
    fn fail(&self, id: &str, error: &str) -> Result<(), SessionError>;

    /// 取走指定的音频产物（AudioReady → Idle）；产物已被替换或取走时报错
    fn take_artifact(&self, id: &str, token: &ArtifactToken) -> Result<AudioArtifact, SessionError>;

    /// 检查会话是否有效
    fn is_valid(&self, id: &str) -> bool;

    /// 关闭会话，返回最终快照
    fn close(&self, id: &str) -> Result<Session, SessionError>;

    /// 仅在会话空闲时关闭；检查与删除在同一把锁内完成，运行中返回 None
    fn close_if_idle(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取所有过期且空闲的会话 ID
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;
}
