//! File Storage - 文件系统存储实现
//!
//! - `FileAudioStorage`: 实现 AudioStoragePort，音频产物按令牌命名
//! - `TempFileStore`: 运行期临时文档（上传的 PDF）

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{
    AudioArtifact, AudioChunkStream, AudioStorageError, AudioStoragePort,
};
use crate::domain::podcast::{ArtifactToken, SynthesisParams};

/// 文件系统音频存储
pub struct FileAudioStorage {
    /// 存储根目录
    base_dir: PathBuf,
    params: SynthesisParams,
}

impl FileAudioStorage {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, AudioStorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            params: SynthesisParams::podcast(),
        })
    }

    /// 写入全部分块，返回写入的字节数
    async fn write_chunks(
        &self,
        path: &Path,
        mut chunks: AudioChunkStream,
    ) -> Result<u64, AudioStorageError> {
        let mut file = fs::File::create(path)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;
        let mut written = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AudioStorageError::IoError(e.to_string()))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        if written == 0 {
            return Err(AudioStorageError::EmptyPayload);
        }
        Ok(written)
    }
}

#[async_trait]
impl AudioStoragePort for FileAudioStorage {
    fn artifact_path(&self, token: &ArtifactToken) -> PathBuf {
        self.base_dir
            .join(token.file_name(self.params.file_extension()))
    }

    async fn save_stream(
        &self,
        token: &ArtifactToken,
        chunks: AudioChunkStream,
    ) -> Result<AudioArtifact, AudioStorageError> {
        let path = self.artifact_path(token);

        let size_bytes = match self.write_chunks(&path, chunks).await {
            Ok(size) => size,
            Err(e) => {
                // 不留下部分文件
                if let Err(remove_err) = fs::remove_file(&path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %path.display(),
                            error = %remove_err,
                            "Failed to remove partial audio file"
                        );
                    }
                }
                return Err(e);
            }
        };

        tracing::debug!(
            token = %token,
            size_bytes = size_bytes,
            "Saved audio artifact"
        );

        Ok(AudioArtifact {
            token: *token,
            path,
            size_bytes,
            mime_type: self.params.mime_type(),
        })
    }

    async fn read(&self, artifact: &AudioArtifact) -> Result<Vec<u8>, AudioStorageError> {
        if !artifact.path.exists() {
            return Err(AudioStorageError::FileNotFound(
                artifact.path.to_string_lossy().to_string(),
            ));
        }

        fs::read(&artifact.path)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))
    }

    async fn delete(&self, artifact: &AudioArtifact) -> Result<(), AudioStorageError> {
        if artifact.path.exists() {
            fs::remove_file(&artifact.path)
                .await
                .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

            tracing::debug!(token = %artifact.token, "Deleted audio artifact");
        }

        Ok(())
    }

    async fn exists(&self, artifact: &AudioArtifact) -> bool {
        fs::metadata(&artifact.path).await.is_ok()
    }
}

/// 临时文档扩展名
const TEMP_EXTENSION: &str = "pdf";

/// 临时文件存储
///
/// 每个文件使用新的令牌命名（`<uuid>.pdf`），单写者，运行结束即删除
pub struct TempFileStore {
    base_dir: PathBuf,
}

impl TempFileStore {
    pub async fn new(base_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    /// 写入新的临时文档
    pub async fn write(&self, data: &Bytes) -> std::io::Result<PathBuf> {
        let path = self
            .base_dir
            .join(ArtifactToken::new().file_name(TEMP_EXTENSION));
        fs::write(&path, data).await?;
        Ok(path)
    }

    /// 删除临时文件（不存在时视为成功）
    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// 清理上次进程遗留的临时文件，返回删除数量
    ///
    /// 只删除本存储命名的文件，目录中的其他文件保持不变
    pub async fn sweep(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let owned = entry
                .file_name()
                .to_str()
                .and_then(|name| ArtifactToken::from_file_name(name, TEMP_EXTENSION))
                .is_some();
            if owned && entry.file_type().await?.is_file() {
                self.remove(&path).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(
                dir = %self.base_dir.display(),
                removed = removed,
                "Removed leftover temp files"
            );
        }
        Ok(removed)
    }
}
