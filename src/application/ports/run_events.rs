//! Run Event Sink Port - 运行事件输出
//!
//! 工作流把状态变化与脚本片段推给展示层；实现只做追加，不回读

use uuid::Uuid;

use crate::domain::podcast::RunState;

/// Run Event Sink
pub trait RunEventSink: Send + Sync {
    /// 状态变化
    fn state_changed(&self, session_id: &str, run_id: Option<Uuid>, state: RunState);

    /// 新到达的脚本片段（按到达顺序）
    fn fragment(&self, session_id: &str, run_id: Uuid, index: usize, text: &str);

    /// 运行失败
    fn run_failed(&self, session_id: &str, run_id: Uuid, error: &str);

    /// 音频可播放
    fn audio_ready(&self, session_id: &str, run_id: Uuid, size_bytes: u64);

    /// 会话关闭
    fn session_closed(&self, session_id: &str, reason: &str);
}
