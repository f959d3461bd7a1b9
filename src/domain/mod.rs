//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Podcast Context: 文档、指令、脚本与运行状态
//! - Voice Context: 音色目录

pub mod podcast;
pub mod voice;
