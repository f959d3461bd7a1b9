//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 未带前缀的旧环境变量
const LEGACY_GEMINI_KEY: &str = "GOOGLE_API_KEY";
const LEGACY_ELEVENLABS_KEY: &str = "ELEVENLABS_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PODCASTER_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// 带前缀的 Key 缺失时，回退到 `GOOGLE_API_KEY` / `ELEVENLABS_API_KEY`。
///
/// # 环境变量示例
/// - `PODCASTER_SERVER__PORT=8080`
/// - `PODCASTER_GEMINI__MODEL=gemini-1.5-flash`
/// - `PODCASTER_WORKFLOW__DRY_RUN=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("gemini.model", "gemini-1.5-pro")?
        .set_default("gemini.stream", true)?
        .set_default("gemini.timeout_secs", 0)?
        .set_default("elevenlabs.timeout_secs", 0)?
        .set_default("storage.temp_dir", "data/tmp")?
        .set_default("storage.audio_dir", "data/audio")?
        .set_default("storage.max_upload_size", 50 * 1024 * 1024)?
        .set_default("workflow.require_confirmation", false)?
        .set_default("workflow.max_concurrent_runs", 1)?
        .set_default("workflow.dry_run", false)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 300)?
        .set_default("gc.session_expire_secs", 3600)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: PODCASTER_GEMINI__API_KEY=...
    builder = builder.add_source(
        Environment::with_prefix("PODCASTER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 旧环境变量兜底
    apply_legacy_env(&mut app_config, |name| std::env::var(name).ok());

    // 7. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 用旧环境变量填充缺失的 API Key
fn apply_legacy_env(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let fill = |slot: &mut String, name: &str| {
        if slot.trim().is_empty() {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }
    };

    fill(&mut config.gemini.api_key, LEGACY_GEMINI_KEY);
    fill(&mut config.elevenlabs.api_key, LEGACY_ELEVENLABS_KEY);
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }

    // dry-run 不调用外部服务，不需要 Key
    if !config.workflow.dry_run {
        if config.gemini.api_key.trim().is_empty() {
            return invalid("Gemini API key is missing (set PODCASTER_GEMINI__API_KEY or GOOGLE_API_KEY)");
        }
        if config.elevenlabs.api_key.trim().is_empty() {
            return invalid(
                "ElevenLabs API key is missing (set PODCASTER_ELEVENLABS__API_KEY or ELEVENLABS_API_KEY)",
            );
        }
    }

    if config.gemini.model.trim().is_empty() {
        return invalid("Gemini model cannot be empty");
    }

    if config.workflow.max_concurrent_runs == 0 {
        return invalid("workflow.max_concurrent_runs must be at least 1");
    }

    if config.workflow.voice_profile().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Unknown default voice: {}",
            config.workflow.default_voice
        )));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return invalid("GC interval cannot be 0 when GC is enabled");
    }

    Ok(())
}

/// 隐藏 Key，只保留末尾 4 个字符
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "<unset>".to_string(),
        n if n <= 8 => "****".to_string(),
        n => format!("****{}", chars[n - 4..].iter().collect::<String>()),
    }
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Gemini URL: {}", config.gemini.base_url);
    tracing::info!("Gemini Model: {}", config.gemini.model);
    tracing::info!("Gemini Key: {}", mask_secret(&config.gemini.api_key));
    tracing::info!("Gemini Streaming: {}", config.gemini.stream);
    tracing::info!("ElevenLabs URL: {}", config.elevenlabs.base_url);
    tracing::info!("ElevenLabs Key: {}", mask_secret(&config.elevenlabs.api_key));
    tracing::info!("Temp Directory: {:?}", config.storage.temp_dir);
    tracing::info!("Audio Directory: {:?}", config.storage.audio_dir);
    tracing::info!("Max Upload Size: {} bytes", config.storage.max_upload_size);
    tracing::info!("Default Voice: {}", config.workflow.default_voice);
    tracing::info!("Require Confirmation: {}", config.workflow.require_confirmation);
    tracing::info!("Max Concurrent Runs: {}", config.workflow.max_concurrent_runs);
    tracing::info!("Dry Run: {}", config.workflow.dry_run);
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Session Expire: {}s", config.gc.session_expire_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn keyed_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.gemini.api_key = "gemini-key".to_string();
        config.elevenlabs.api_key = "eleven-key".to_string();
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&keyed_config()).is_ok());
    }

    #[test]
    fn test_validation_requires_keys_unless_dry_run() {
        let mut config = AppConfig::default();
        assert!(validate_config(&config).is_err());

        config.workflow.dry_run = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = keyed_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_errors_for_workflow() {
        let mut config = keyed_config();
        config.workflow.max_concurrent_runs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = keyed_config();
        config.workflow.default_voice = "Nobody".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = keyed_config();
        config.gemini.model = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_legacy_env_fills_missing_keys_only() {
        let mut config = AppConfig::default();
        config.elevenlabs.api_key = "configured".to_string();

        apply_legacy_env(&mut config, |name| match name {
            "GOOGLE_API_KEY" => Some("legacy-google".to_string()),
            "ELEVENLABS_API_KEY" => Some("legacy-eleven".to_string()),
            _ => None,
        });

        assert_eq!(config.gemini.api_key, "legacy-google");
        assert_eq!(config.elevenlabs.api_key, "configured");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8088

[gemini]
api_key = "file-key"
stream = false

[elevenlabs]
api_key = "file-eleven"

[workflow]
default_voice = "pqHfZKP75CvOlQylNhV4"
require_confirmation = true
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert!(!config.gemini.stream);
        assert!(config.workflow.require_confirmation);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(
            config.workflow.voice_profile().unwrap().voice_id,
            "pqHfZKP75CvOlQylNhV4"
        );
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "<unset>");
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("abcdefghijkl"), "****ijkl");
    }
}
