//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{
    AudioStorageError, GenerationError, SessionError, StagingError, SynthesisError,
};
use crate::domain::podcast::PodcastError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误（非 PDF、缺少文档、未知音色等）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 本地存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 外部服务错误（生成 / 合成）
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建外部服务错误
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::not_found("Session", id),
            SessionError::InvalidTransition { .. } | SessionError::InvalidOperation(_) => {
                Self::InvalidState(err.to_string())
            }
            SessionError::AlreadyExists(_) => Self::InternalError(err.to_string()),
        }
    }
}

impl From<PodcastError> for ApplicationError {
    fn from(err: PodcastError) -> Self {
        match err {
            PodcastError::EmptyDocument | PodcastError::NotPdf(_) => {
                Self::ValidationError(err.to_string())
            }
            PodcastError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
            PodcastError::EmptyScript => Self::UpstreamError(err.to_string()),
        }
    }
}

impl From<StagingError> for ApplicationError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::StorageError(msg) => Self::StorageError(msg),
            StagingError::UpstreamError(msg) => Self::UpstreamError(msg),
        }
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        Self::UpstreamError(err.to_string())
    }
}

impl From<SynthesisError> for ApplicationError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::EmptyText | SynthesisError::VoiceNotFound(_) => {
                Self::ValidationError(err.to_string())
            }
            _ => Self::UpstreamError(err.to_string()),
        }
    }
}

impl From<AudioStorageError> for ApplicationError {
    fn from(err: AudioStorageError) -> Self {
        match err {
            AudioStorageError::SourceError(source) => source.into(),
            AudioStorageError::EmptyPayload => Self::UpstreamError(err.to_string()),
            AudioStorageError::FileNotFound(_) | AudioStorageError::IoError(_) => {
                Self::StorageError(err.to_string())
            }
        }
    }
}
