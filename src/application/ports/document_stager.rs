//! Document Stager Port - 文档暂存
//!
//! 把上传的 PDF 写入临时文件并登记到生成服务，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::podcast::UploadedDocument;

/// 暂存错误
#[derive(Debug, Error)]
pub enum StagingError {
    /// 本地磁盘读写失败
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 上传到生成服务失败
    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

/// 已暂存文档的句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// 生成服务中的文件 URI（用于生成请求）
    pub uri: String,
    /// 文件 MIME 类型
    pub mime_type: String,
    /// 生成服务中的资源名称（如 `files/abc123`）
    pub remote_name: Option<String>,
    /// 本地临时文件路径
    pub local_path: PathBuf,
}

/// Document Stager Port
#[async_trait]
pub trait DocumentStagerPort: Send + Sync {
    /// 写入临时文件并登记到生成服务
    async fn stage(&self, document: &UploadedDocument) -> Result<DocumentHandle, StagingError>;

    /// 删除本地临时文件
    ///
    /// 调用方只记录失败，不中断运行
    async fn release(&self, handle: &DocumentHandle) -> Result<(), StagingError>;
}
