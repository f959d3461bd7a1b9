//! Session Queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::podcast::RunState;

/// 获取会话状态查询
#[derive(Debug, Clone)]
pub struct GetSessionStatus {
    pub session_id: String,
}

/// 会话状态快照
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub state: RunState,
    pub file_name: Option<String>,
    pub document_size: Option<usize>,
    pub addendum: Option<String>,
    pub run_id: Option<Uuid>,
    pub voice: Option<String>,
    /// 已收到的脚本（运行失败时为部分脚本）
    pub script: String,
    pub fragment_count: usize,
    pub audio_size_bytes: Option<u64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}
