//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::podcast::RunState;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionIdRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveAddendumRequest {
    pub session_id: String,
    #[serde(default)]
    pub addendum: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub state: RunState,
}

#[derive(Debug, Serialize)]
pub struct DocumentUploadedResponse {
    pub session_id: String,
    pub state: RunState,
    pub file_name: Option<String>,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionClosedResponse {
    pub session_id: String,
    pub deleted_audio: bool,
}

// ============================================================================
// Run DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExecuteRunRequest {
    pub session_id: String,
    /// 音色名称或 ID
    pub voice: Option<String>,
    /// 指令追加内容，覆盖已保存的内容
    pub addendum: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub session_id: String,
    pub run_id: Uuid,
    pub state: RunState,
    pub voice: &'static str,
    pub voice_id: &'static str,
}
