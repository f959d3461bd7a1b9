//! Audio Storage Port - 出站端口
//!
//! 定义音频产物的落盘、读取与删除

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::{AudioChunkStream, SynthesisError};
use crate::domain::podcast::ArtifactToken;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    /// 合成服务的分块流中途失败
    #[error("Audio source failed: {0}")]
    SourceError(#[from] SynthesisError),

    /// 合成服务没有返回任何音频
    #[error("Audio payload is empty")]
    EmptyPayload,
}

/// 已落盘的音频产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub token: ArtifactToken,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mime_type: &'static str,
}

/// Audio Storage Port - 出站端口
#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// 获取令牌对应的文件路径
    fn artifact_path(&self, token: &ArtifactToken) -> PathBuf;

    /// 按到达顺序写入全部分块
    ///
    /// 失败时删除已写入的部分文件，不留下产物
    async fn save_stream(
        &self,
        token: &ArtifactToken,
        chunks: AudioChunkStream,
    ) -> Result<AudioArtifact, AudioStorageError>;

    /// 读取音频数据
    async fn read(&self, artifact: &AudioArtifact) -> Result<Vec<u8>, AudioStorageError>;

    /// 删除音频文件
    async fn delete(&self, artifact: &AudioArtifact) -> Result<(), AudioStorageError>;

    /// 检查音频是否存在
    async fn exists(&self, artifact: &AudioArtifact) -> bool;
}
