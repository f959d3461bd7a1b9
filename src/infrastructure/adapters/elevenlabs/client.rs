//! ElevenLabs Client - 调用 ElevenLabs text-to-speech API
//!
//! 实现 VoiceSynthesizerPort
//!
//! POST {base}/v1/text-to-speech/{voice_id}?output_format=mp3_22050_32
//! Request: {"text": "...", "model_id": "...", "voice_settings": {...}}  (JSON)
//! Response: 音频二进制流

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    AudioChunkStream, SynthesisError, SynthesisRequest, VoiceSynthesizerPort,
};
use crate::domain::podcast::VoiceSettings;

const API_KEY_HEADER: &str = "xi-api-key";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsClientConfig {
    pub api_key: String,
    /// API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），0 表示不设置
    pub timeout_secs: u64,
}

impl Default for ElevenLabsClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.elevenlabs.io".to_string(),
            timeout_secs: 0,
        }
    }
}

impl ElevenLabsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ElevenLabs 客户端
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsClientConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsClientConfig) -> Result<Self, SynthesisError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn synthesis_url(&self, voice_id: &str, output_format: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            voice_id,
            output_format
        )
    }
}

#[async_trait]
impl VoiceSynthesizerPort for ElevenLabsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioChunkStream, SynthesisError> {
        let params = request.params();
        let url = self.synthesis_url(request.voice_id(), params.output_format);
        let body = TextToSpeechBody {
            text: request.text(),
            model_id: params.model_id,
            voice_settings: params.voice_settings,
        };

        tracing::debug!(
            voice_id = %request.voice_id(),
            model_id = %params.model_id,
            output_format = %params.output_format,
            text_len = request.text().len(),
            "Sending text-to-speech request"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_transport_error))
            .boxed())
    }
}

fn map_transport_error(e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout
    } else if e.is_connect() {
        SynthesisError::NetworkError(format!("Cannot connect to ElevenLabs API: {}", e))
    } else {
        SynthesisError::NetworkError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::podcast::SynthesisParams;
    use axum::{
        extract::{Path, Query},
        http::HeaderMap,
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;

    const BILL: &str = "pqHfZKP75CvOlQylNhV4";

    #[test]
    fn test_config_builder() {
        let config = ElevenLabsClientConfig::new("key")
            .with_base_url("http://example.com:9000")
            .with_timeout(60);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_synthesis_url() {
        let client = ElevenLabsClient::new(ElevenLabsClientConfig::new("key")).unwrap();
        assert_eq!(
            client.synthesis_url(BILL, "mp3_22050_32"),
            "https://api.elevenlabs.io/v1/text-to-speech/pqHfZKP75CvOlQylNhV4?output_format=mp3_22050_32"
        );
    }

    #[test]
    fn test_body_carries_fixed_params() {
        let params = SynthesisParams::podcast();
        let body = serde_json::to_value(TextToSpeechBody {
            text: "Hello",
            model_id: params.model_id,
            voice_settings: params.voice_settings,
        })
        .unwrap();

        assert_eq!(body["model_id"], "eleven_turbo_v2_5");
        assert_eq!(body["voice_settings"]["stability"], 0.0);
        assert_eq!(body["voice_settings"]["similarity_boost"], 1.0);
        assert_eq!(body["voice_settings"]["style"], 0.0);
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }

    #[tokio::test]
    async fn test_synthesize_against_mock_server() {
        let app = Router::new().route(
            "/v1/text-to-speech/:voice_id",
            post(
                |Path(voice_id): Path<String>,
                 Query(query): Query<HashMap<String, String>>,
                 headers: HeaderMap,
                 Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(voice_id, BILL);
                    assert_eq!(query["output_format"], "mp3_22050_32");
                    assert_eq!(headers["xi-api-key"], "secret");
                    assert_eq!(body["text"], "Hello listeners");
                    vec![0x49u8, 0x44, 0x33, 0x04, 0x00]
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            ElevenLabsClient::new(ElevenLabsClientConfig::new("secret").with_base_url(base)).unwrap();
        let request =
            SynthesisRequest::new("Hello listeners", BILL, SynthesisParams::podcast()).unwrap();

        let chunks: Vec<_> = client
            .synthesize(request)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        let audio: Vec<u8> = chunks.concat();
        assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04, 0x00]);
    }
}
