//! Podcaster - PDF 转播客服务
//!
//! 上传 PDF → Gemini 生成单人播客脚本（流式展示）→ ElevenLabs 合成 MP3 → 播放 / 下载
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Podcast Context: 运行状态机、文档、指令、脚本、合成参数
//! - Voice Context: 固定音色目录
//!
//! 应用层 (application/):
//! - Ports: DocumentStager, ScriptGenerator, VoiceSynthesizer, AudioStorage, SessionManager, RunEventSink
//! - Commands: 会话与运行命令，PodcastWorkflow 编排
//! - Queries: 会话状态、音色列表、音频
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager 内存实现
//! - Worker: SessionReaper 过期会话回收
//! - Adapters: Gemini, ElevenLabs, 文件存储, dry-run 假适配器
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
