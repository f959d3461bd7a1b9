//! Voice Synthesizer Port - 语音合成抽象
//!
//! 定义 TTS 服务的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::podcast::SynthesisParams;
use crate::domain::voice;

/// TTS 错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Text to synthesize is empty")]
    EmptyText,

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    text: String,
    voice_id: String,
    params: SynthesisParams,
}

impl SynthesisRequest {
    /// 校验后创建：文本非空，音色在目录中
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        params: SynthesisParams,
    ) -> Result<Self, SynthesisError> {
        let text = text.into();
        let voice_id = voice_id.into();

        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        if voice::find_by_id(&voice_id).is_none() {
            return Err(SynthesisError::VoiceNotFound(voice_id));
        }

        Ok(Self {
            text,
            voice_id,
            params,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }
}

/// 音频分块流，按到达顺序拼接即为完整音频
pub type AudioChunkStream = BoxStream<'static, Result<Bytes, SynthesisError>>;

/// Voice Synthesizer Port
#[async_trait]
pub trait VoiceSynthesizerPort: Send + Sync {
    /// 合成语音
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioChunkStream, SynthesisError>;
}
