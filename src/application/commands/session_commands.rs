//! Session Commands - 会话相关命令

use bytes::Bytes;

use crate::application::ports::AudioArtifact;
use crate::domain::podcast::RunState;

/// 创建会话命令
#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand;

/// 创建会话响应
#[derive(Debug, Clone)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub state: RunState,
}

/// 上传文档命令
#[derive(Debug, Clone)]
pub struct UploadDocumentCommand {
    pub session_id: String,
    pub bytes: Bytes,
    /// 客户端声明的 Content-Type
    pub media_type: Option<String>,
    pub file_name: Option<String>,
}

/// 上传文档响应
#[derive(Debug, Clone)]
pub struct UploadDocumentResponse {
    pub session_id: String,
    pub state: RunState,
    pub file_name: Option<String>,
    pub size_bytes: usize,
}

/// 保存指令追加内容命令
#[derive(Debug, Clone)]
pub struct SaveAddendumCommand {
    pub session_id: String,
    pub addendum: String,
}

/// 关闭会话命令
#[derive(Debug, Clone)]
pub struct CloseSessionCommand {
    pub session_id: String,
}

/// 关闭会话响应
#[derive(Debug, Clone)]
pub struct CloseSessionResponse {
    pub session_id: String,
    pub deleted_audio: bool,
}

/// 下载音频命令
///
/// 下载即消费：文件发送后删除，会话回到 Idle
#[derive(Debug, Clone)]
pub struct DownloadAudioCommand {
    pub session_id: String,
}

/// 下载的音频
///
/// 读取时不改变会话，响应发送完毕后用 `artifact` 调用 `DownloadAudioHandler::finish`
#[derive(Debug, Clone)]
pub struct DownloadedAudio {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
    pub artifact: AudioArtifact,
}
