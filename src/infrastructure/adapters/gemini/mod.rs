//! Gemini Adapter - 脚本生成
//!
//! Files API 上传 + generateContent / streamGenerateContent

mod client;
mod document_stager;
mod stream;
mod types;

pub use client::{GeminiClient, GeminiClientConfig};
pub use document_stager::GeminiDocumentStager;
pub use stream::{fragment_stream, SseDecoder};
