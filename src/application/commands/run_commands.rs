//! Run Commands - 运行相关命令

use crate::application::ports::AudioArtifact;

/// 执行运行命令
#[derive(Debug, Clone)]
pub struct ExecuteRunCommand {
    pub session_id: String,
    /// 音色名称或 ID；为空时使用默认音色
    pub voice: Option<String>,
    /// 指令追加内容；为空时使用会话中保存的内容
    pub addendum: Option<String>,
}

/// 确认合成命令（仅在需要确认时使用）
#[derive(Debug, Clone)]
pub struct ConfirmSynthesisCommand {
    pub session_id: String,
}

/// 运行结果
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// 音频已就绪
    AudioReady(AudioArtifact),
    /// 脚本就绪，等待确认后再合成
    AwaitingConfirmation,
}
