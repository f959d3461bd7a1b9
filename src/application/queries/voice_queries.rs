//! Voice Queries

use serde::Serialize;

/// 列出所有可选音色查询
#[derive(Debug, Clone)]
pub struct ListVoices;

/// 音色选项
#[derive(Debug, Clone, Serialize)]
pub struct VoiceOption {
    pub label: &'static str,
    pub voice_id: &'static str,
    pub is_default: bool,
}
