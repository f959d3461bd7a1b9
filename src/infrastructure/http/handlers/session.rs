//! Session HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;

use crate::application::{
    CloseSessionCommand, CreateSessionCommand, GetSessionStatus, SaveAddendumCommand,
    SessionStatus, UploadDocumentCommand,
};
use crate::infrastructure::http::dto::{
    ApiResponse, DocumentUploadedResponse, Empty, SaveAddendumRequest, SessionClosedResponse,
    SessionCreatedResponse, SessionIdRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 创建会话
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SessionCreatedResponse>>, ApiError> {
    let result = state.create_session_handler.handle(CreateSessionCommand)?;

    Ok(Json(ApiResponse::success(SessionCreatedResponse {
        session_id: result.session_id,
        state: result.state,
    })))
}

/// 上传 PDF 文档
///
/// multipart 字段：`session_id`（文本）、`file`（PDF）
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentUploadedResponse>>, ApiError> {
    let mut session_id: Option<String> = None;
    let mut file: Option<(Bytes, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "session_id" => {
                session_id = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read session_id: {}", e))
                })?);
            }
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((data, content_type, file_name));
            }
            _ => {}
        }
    }

    let session_id =
        session_id.ok_or_else(|| ApiError::BadRequest("Missing session_id".to_string()))?;
    let (bytes, media_type, file_name) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file".to_string()))?;

    let result = state
        .upload_document_handler
        .handle(UploadDocumentCommand {
            session_id,
            bytes,
            media_type,
            file_name,
        })
        .await?;

    Ok(Json(ApiResponse::success(DocumentUploadedResponse {
        session_id: result.session_id,
        state: result.state,
        file_name: result.file_name,
        size_bytes: result.size_bytes,
    })))
}

/// 保存指令追加内容（空字符串表示清除）
pub async fn save_addendum(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveAddendumRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.save_addendum_handler.handle(SaveAddendumCommand {
        session_id: req.session_id,
        addendum: req.addendum,
    })?;

    Ok(Json(ApiResponse::ok()))
}

/// 查询会话状态
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    let status = state.session_status_handler.handle(GetSessionStatus {
        session_id: req.session_id,
    })?;

    Ok(Json(ApiResponse::success(status)))
}

/// 关闭会话
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionClosedResponse>>, ApiError> {
    let result = state
        .close_session_handler
        .handle(CloseSessionCommand {
            session_id: req.session_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(SessionClosedResponse {
        session_id: result.session_id,
        deleted_audio: result.deleted_audio,
    })))
}
