//! Fake Voice Synthesizer - 返回确定性的伪音频字节

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::lock;
use crate::application::ports::{
    AudioChunkStream, SynthesisError, SynthesisRequest, VoiceSynthesizerPort,
};

const DEFAULT_CHUNK_SIZE: usize = 4;

/// Fake Voice Synthesizer
pub struct FakeVoiceSynthesizer {
    chunk_size: usize,
    /// 输出 N 个分块后中断
    fail_after_chunks: Option<usize>,
    calls: AtomicUsize,
    last_voice_id: Mutex<Option<String>>,
    last_text: Mutex<Option<String>>,
}

impl FakeVoiceSynthesizer {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            fail_after_chunks: None,
            calls: AtomicUsize::new(0),
            last_voice_id: Mutex::new(None),
            last_text: Mutex::new(None),
        }
    }

    pub fn failing_after_chunks(mut self, chunks: usize) -> Self {
        self.fail_after_chunks = Some(chunks);
        self
    }

    /// 文本对应的伪音频内容
    pub fn audio_for(text: &str) -> Vec<u8> {
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        audio
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_voice_id(&self) -> Option<String> {
        lock(&self.last_voice_id).clone()
    }

    pub fn last_text(&self) -> Option<String> {
        lock(&self.last_text).clone()
    }
}

impl Default for FakeVoiceSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceSynthesizerPort for FakeVoiceSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioChunkStream, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_voice_id) = Some(request.voice_id().to_string());
        *lock(&self.last_text) = Some(request.text().to_string());

        tracing::debug!(
            voice_id = %request.voice_id(),
            text_len = request.text().len(),
            "FakeVoiceSynthesizer: returning placeholder audio"
        );

        let audio = Self::audio_for(request.text());
        let mut chunks: Vec<Result<Bytes, SynthesisError>> = audio
            .chunks(self.chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        if let Some(n) = self.fail_after_chunks {
            chunks.truncate(n);
            chunks.push(Err(SynthesisError::NetworkError(
                "simulated connection reset".to_string(),
            )));
        }

        Ok(stream::iter(chunks).boxed())
    }
}
