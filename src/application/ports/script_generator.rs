//! Script Generator Port - 脚本生成抽象
//!
//! 定义生成服务的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DocumentHandle;
use crate::domain::podcast::Instruction;

/// 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prompt blocked: {0}")]
    Blocked(String),
}

/// 响应模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// 增量返回片段
    #[default]
    Streaming,
    /// 一次返回全文（单个片段）
    Whole,
}

/// 生成请求（单次运行内不可变）
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub document: DocumentHandle,
    pub instruction: Instruction,
    pub mode: GenerationMode,
}

/// 片段流：有限、惰性、不可重启；耗尽即完成
pub type FragmentStream = BoxStream<'static, Result<String, GenerationError>>;

/// Script Generator Port
#[async_trait]
pub trait ScriptGeneratorPort: Send + Sync {
    /// 提交生成请求，返回按生成顺序到达的片段流
    async fn generate(&self, request: GenerationRequest) -> Result<FragmentStream, GenerationError>;
}
