//! Voice Context - 音色目录
//!
//! 职责:
//! - 固定音色表
//! - 名称 / ID 解析

mod catalog;

pub use catalog::{
    all_voices, default_voice, find_by_id, find_by_label, resolve, VoiceProfile,
    DEFAULT_VOICE_LABEL, VOICE_CATALOG,
};
