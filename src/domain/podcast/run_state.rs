//! Run State Machine
//!
//! Idle → DocumentUploaded → Generating → ScriptReady → Synthesizing → AudioReady → Idle
//! 任一调用阶段失败进入 Failed

use serde::{Deserialize, Serialize};

/// 单次运行（上传到下载）的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// 没有文档
    Idle,
    /// 文档已上传，等待用户触发
    DocumentUploaded,
    /// 正在生成脚本
    Generating,
    /// 脚本生成完毕
    ScriptReady,
    /// 正在合成语音
    Synthesizing,
    /// 音频可播放 / 下载
    AudioReady,
    /// 运行失败（已生成的部分脚本保留）
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::DocumentUploaded => "document_uploaded",
            RunState::Generating => "generating",
            RunState::ScriptReady => "script_ready",
            RunState::Synthesizing => "synthesizing",
            RunState::AudioReady => "audio_ready",
            RunState::Failed => "failed",
        }
    }

    /// 检查迁移是否合法
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;

        matches!(
            (*self, next),
            (Idle, DocumentUploaded)
                | (DocumentUploaded, DocumentUploaded)
                | (DocumentUploaded, Generating)
                | (Generating, ScriptReady)
                | (Generating, Failed)
                | (ScriptReady, Synthesizing)
                | (ScriptReady, Generating)
                | (ScriptReady, DocumentUploaded)
                | (ScriptReady, Failed)
                | (Synthesizing, AudioReady)
                | (Synthesizing, Failed)
                | (AudioReady, Idle)
                | (AudioReady, DocumentUploaded)
                | (AudioReady, Generating)
                | (Failed, DocumentUploaded)
                | (Failed, Generating)
        )
    }

    /// 是否有外部调用正在进行
    pub fn is_busy(&self) -> bool {
        matches!(self, RunState::Generating | RunState::Synthesizing)
    }

    /// 脚本就绪后的下一个状态
    ///
    /// 默认自动进入 Synthesizing；需要确认时停留在 ScriptReady
    pub fn after_script_ready(require_confirmation: bool) -> RunState {
        if require_confirmation {
            RunState::ScriptReady
        } else {
            RunState::Synthesizing
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
