//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::GenerationMode;
use crate::domain::voice::{self, VoiceProfile};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// Gemini（脚本生成）配置
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// ElevenLabs（语音合成）配置
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 工作流配置
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// GC 配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Gemini 配置
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API Key（也可由 GOOGLE_API_KEY 提供）
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gemini_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// 是否使用流式生成
    #[serde(default = "default_stream")]
    pub stream: bool,

    /// 请求超时时间（秒），0 表示不设置
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_stream() -> bool {
    true
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_gemini_url(),
            model: default_gemini_model(),
            stream: default_stream(),
            timeout_secs: 0,
        }
    }
}

impl GeminiConfig {
    pub fn generation_mode(&self) -> GenerationMode {
        if self.stream {
            GenerationMode::Streaming
        } else {
            GenerationMode::Whole
        }
    }
}

/// ElevenLabs 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ElevenLabsConfig {
    /// API Key（也可由 ELEVENLABS_API_KEY 提供）
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_elevenlabs_url")]
    pub base_url: String,

    /// 请求超时时间（秒），0 表示不设置
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_elevenlabs_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_elevenlabs_url(),
            timeout_secs: 0,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 临时文档目录（上传的 PDF）
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// 音频产物目录
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// 上传文件最大大小（字节），0 表示不限制
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/tmp")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/audio")
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            audio_dir: default_audio_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl StorageConfig {
    /// 请求体大小限制，0 表示不限制
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_upload_size).unwrap_or(usize::MAX)
    }
}

/// 工作流配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// 默认音色（名称或 ID）
    #[serde(default = "default_voice_label")]
    pub default_voice: String,

    /// 脚本就绪后等待确认再合成
    #[serde(default)]
    pub require_confirmation: bool,

    /// 同时执行的运行数
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// 使用离线的假适配器，不调用外部服务
    #[serde(default)]
    pub dry_run: bool,
}

fn default_voice_label() -> String {
    voice::default_voice().label.to_string()
}

fn default_max_concurrent_runs() -> usize {
    1
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_voice: default_voice_label(),
            require_confirmation: false,
            max_concurrent_runs: default_max_concurrent_runs(),
            dry_run: false,
        }
    }
}

impl WorkflowConfig {
    /// 解析配置的默认音色
    pub fn voice_profile(&self) -> Option<VoiceProfile> {
        voice::resolve(&self.default_voice).copied()
    }
}

/// GC（会话回收）配置
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用自动回收
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// 回收间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,

    /// Session 空闲过期时间（秒）
    #[serde(default = "default_session_expire")]
    pub session_expire_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    300 // 5 分钟
}

fn default_session_expire() -> u64 {
    3600 // 1 小时
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            session_expire_secs: default_session_expire(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5060);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.generation_mode(), GenerationMode::Streaming);
        assert_eq!(config.elevenlabs.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.storage.max_upload_size, 50 * 1024 * 1024);
        assert_eq!(config.workflow.max_concurrent_runs, 1);
        assert!(!config.workflow.require_confirmation);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5060");
    }

    #[test]
    fn test_default_voice_resolves() {
        let config = WorkflowConfig::default();
        let profile = config.voice_profile().unwrap();
        assert_eq!(profile.voice_id, "pqHfZKP75CvOlQylNhV4");

        let by_id = WorkflowConfig {
            default_voice: "pqHfZKP75CvOlQylNhV4".to_string(),
            ..WorkflowConfig::default()
        };
        assert_eq!(by_id.voice_profile().unwrap().label, voice::DEFAULT_VOICE_LABEL);
    }

    #[test]
    fn test_generation_mode_from_stream_flag() {
        let config = GeminiConfig {
            stream: false,
            ..GeminiConfig::default()
        };
        assert_eq!(config.generation_mode(), GenerationMode::Whole);
    }
}
