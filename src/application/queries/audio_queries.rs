//! Audio Queries - 音频查询

/// 获取会话当前音频（播放用，不消费）
#[derive(Debug, Clone)]
pub struct GetAudioQuery {
    pub session_id: String,
}
