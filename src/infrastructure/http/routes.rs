//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                       GET   健康检查
//! - /api/voice/list                 GET   列出可选音色
//! - /api/session/create             POST  创建会话
//! - /api/session/upload             POST  上传 PDF（multipart: session_id, file）
//! - /api/session/addendum           POST  保存指令追加内容
//! - /api/session/status             POST  查询会话状态与已生成脚本
//! - /api/session/close              POST  关闭会话
//! - /api/run/execute                POST  开始运行（结果通过 WS 通知）
//! - /api/run/confirm                POST  确认合成（仅在需要确认时）
//! - /api/audio/{session_id}         GET   播放音频
//! - /api/audio/{session_id}/download GET  下载音频（下载后删除）
//! - /ws/session/{id}                WS    Session WebSocket（运行事件）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/voice/list", get(handlers::list_voices))
        .nest("/session", session_routes())
        .nest("/run", run_routes())
        .nest("/audio", audio_routes())
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_session))
        .route("/upload", post(handlers::upload_document))
        .route("/addendum", post(handlers::save_addendum))
        .route("/status", post(handlers::session_status))
        .route("/close", post(handlers::close_session))
}

/// Run 路由
fn run_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute_run))
        .route("/confirm", post(handlers::confirm_synthesis))
}

/// Audio 路由
fn audio_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:session_id", get(handlers::play_audio))
        .route("/:session_id/download", get(handlers::download_audio))
}
