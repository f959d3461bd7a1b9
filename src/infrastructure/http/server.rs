//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 默认上传大小限制（50MB）
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 请求体大小限制，0 表示不限制
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5060,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn body_limit(&self) -> DefaultBodyLimit {
        match self.max_upload_size {
            0 => DefaultBodyLimit::disable(),
            bytes => DefaultBodyLimit::max(bytes),
        }
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 共享的应用状态（后台任务使用）
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// 构建 Router
    fn build_router(&self) -> Router {
        // CORS 配置 - 允许所有来源的跨域请求
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        create_routes()
            .layer(self.config.body_limit())
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {}", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!(
            max_upload_size = self.config.max_upload_size,
            "Starting HTTP server on {} (with graceful shutdown)", addr
        );

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::WorkflowOptions;
    use crate::infrastructure::adapters::{
        FakeDocumentStager, FakeScriptGenerator, FakeVoiceSynthesizer, FileAudioStorage,
        TempFileStore,
    };
    use crate::infrastructure::http::state::Adapters;
    use crate::infrastructure::{EventPublisher, InMemorySessionManager};
    use axum::body::{to_bytes, Body};
    use http::{header, HeaderMap, Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "podcaster-test-boundary";
    const FRAGMENTS: [&str; 2] = ["Welcome to the show. ", "Today we read a paper."];

    async fn test_server(max_upload_size: usize) -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let temp_files = Arc::new(TempFileStore::new(dir.path().join("tmp")).await.unwrap());
        let storage = Arc::new(FileAudioStorage::new(dir.path().join("audio")).await.unwrap());

        let adapters = Adapters {
            stager: Arc::new(FakeDocumentStager::new(temp_files)),
            generator: Arc::new(FakeScriptGenerator::new(
                FRAGMENTS.iter().map(|f| f.to_string()).collect(),
            )),
            synthesizer: Arc::new(FakeVoiceSynthesizer::new()),
        };
        let state = AppState::new(
            InMemorySessionManager::new().arc(),
            storage,
            adapters,
            EventPublisher::new().arc(),
            WorkflowOptions::default(),
        );

        let config = ServerConfig::new("127.0.0.1", 0).with_max_upload_size(max_upload_size);
        let router = HttpServer::new(config, state).build_router();
        (dir, router)
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn get_json(router: &Router, uri: &str) -> Value {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, _, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    async fn post_json(router: &Router, uri: &str, payload: Value) -> Value {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, _, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    fn upload_request(session_id: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{session_id}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/session/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(router: &Router) -> String {
        let created = post_json(router, "/api/session/create", json!({})).await;
        assert_eq!(created["errno"], 0);
        assert_eq!(created["data"]["state"], "idle");
        created["data"]["session_id"].as_str().unwrap().to_string()
    }

    async fn wait_for_state(router: &Router, session_id: &str, wanted: &str) -> Value {
        for _ in 0..200 {
            let status = post_json(router, "/api/session/status", json!({ "session_id": session_id })).await;
            let state = status["data"]["state"].as_str().unwrap().to_string();
            if state == wanted {
                return status;
            }
            assert_ne!(state, "failed", "run failed: {}", status);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {}", wanted);
    }

    #[tokio::test]
    async fn test_ping_and_voice_list() {
        let (_dir, router) = test_server(DEFAULT_MAX_UPLOAD_SIZE).await;

        let ping = get_json(&router, "/api/ping").await;
        assert_eq!(ping["status"], "ok");
        assert_eq!(ping["sessions"], 0);

        let voices = get_json(&router, "/api/voice/list").await;
        assert_eq!(voices["errno"], 0);
        let voices = voices["data"].as_array().unwrap();
        assert_eq!(voices.len(), 8);
        let defaults: Vec<&Value> = voices.iter().filter(|v| v["is_default"] == true).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0]["label"], "Bill (American, trustworthy, narration)");
        assert_eq!(defaults[0]["voice_id"], "pqHfZKP75CvOlQylNhV4");
    }

    #[tokio::test]
    async fn test_upload_execute_play_download() {
        let (_dir, router) = test_server(DEFAULT_MAX_UPLOAD_SIZE).await;
        let session_id = create_session(&router).await;

        // Upload
        let (status, _, body) = call(
            &router,
            upload_request(&session_id, "paper.pdf", "application/pdf", b"%PDF-1.4 test"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let uploaded: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(uploaded["errno"], 0);
        assert_eq!(uploaded["data"]["state"], "document_uploaded");
        assert_eq!(uploaded["data"]["file_name"], "paper.pdf");

        // Save addendum
        let saved = post_json(
            &router,
            "/api/session/addendum",
            json!({ "session_id": session_id, "addendum": "Keep it short." }),
        )
        .await;
        assert_eq!(saved["errno"], 0);

        // Execute
        let started = post_json(
            &router,
            "/api/run/execute",
            json!({ "session_id": session_id, "voice": "Bill (American, trustworthy, narration)" }),
        )
        .await;
        assert_eq!(started["errno"], 0);
        assert_eq!(started["data"]["voice_id"], "pqHfZKP75CvOlQylNhV4");

        let status = wait_for_state(&router, &session_id, "audio_ready").await;
        let script = FRAGMENTS.concat();
        assert_eq!(status["data"]["script"], script.as_str());
        assert_eq!(status["data"]["fragment_count"], 2);
        assert_eq!(status["data"]["addendum"], "Keep it short.");

        // Play 可重复
        let expected = FakeVoiceSynthesizer::audio_for(&script);
        for _ in 0..2 {
            let request = Request::get(format!("/api/audio/{}", session_id))
                .body(Body::empty())
                .unwrap();
            let (status, headers, body) = call(&router, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
            assert_eq!(body, expected);
        }

        // 响应体未读完就断开，音频保留
        let request = Request::get(format!("/api/audio/{}/download", session_id))
            .body(Body::empty())
            .unwrap();
        let abandoned = router.clone().oneshot(request).await.unwrap();
        assert_eq!(abandoned.status(), StatusCode::OK);
        drop(abandoned);
        let status = post_json(&router, "/api/session/status", json!({ "session_id": session_id })).await;
        assert_eq!(status["data"]["state"], "audio_ready");

        // Download 消费音频
        let request = Request::get(format!("/api/audio/{}/download", session_id))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = call(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"podcast.mp3\""
        );
        assert_eq!(body, expected);

        let again = get_json(&router, &format!("/api/audio/{}/download", session_id)).await;
        assert_eq!(again["errno"], 404);

        let status = post_json(&router, "/api/session/status", json!({ "session_id": session_id })).await;
        assert_eq!(status["data"]["state"], "idle");
    }

    #[tokio::test]
    async fn test_request_errors_use_envelope() {
        let (_dir, router) = test_server(DEFAULT_MAX_UPLOAD_SIZE).await;

        let unknown = post_json(&router, "/api/run/execute", json!({ "session_id": "missing" })).await;
        assert_eq!(unknown["errno"], 404);
        assert!(unknown["data"].is_null());

        let session_id = create_session(&router).await;

        // 未上传文档
        let no_document = post_json(&router, "/api/run/execute", json!({ "session_id": session_id })).await;
        assert_eq!(no_document["errno"], 400);

        // 非 PDF
        let (_, _, body) = call(
            &router,
            upload_request(&session_id, "notes.txt", "text/plain", b"hello"),
        )
        .await;
        let rejected: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rejected["errno"], 400);

        call(
            &router,
            upload_request(&session_id, "paper.pdf", "application/pdf", b"%PDF-1.4"),
        )
        .await;
        let bad_voice = post_json(
            &router,
            "/api/run/execute",
            json!({ "session_id": session_id, "voice": "Nobody" }),
        )
        .await;
        assert_eq!(bad_voice["errno"], 400);

        let nothing_to_confirm = post_json(&router, "/api/run/confirm", json!({ "session_id": session_id })).await;
        assert_eq!(nothing_to_confirm["errno"], 400);
    }

    #[tokio::test]
    async fn test_upload_limit() {
        let (_dir, router) = test_server(64).await;
        let session_id = create_session(&router).await;

        let (_, _, body) = call(
            &router,
            upload_request(&session_id, "big.pdf", "application/pdf", &[b'x'; 1024]),
        )
        .await;
        let rejected: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rejected["errno"], 400);

        let status = post_json(&router, "/api/session/status", json!({ "session_id": session_id })).await;
        assert_eq!(status["data"]["state"], "idle");
    }

    #[tokio::test]
    async fn test_close_session() {
        let (_dir, router) = test_server(DEFAULT_MAX_UPLOAD_SIZE).await;
        let session_id = create_session(&router).await;

        let closed = post_json(&router, "/api/session/close", json!({ "session_id": session_id })).await;
        assert_eq!(closed["errno"], 0);
        assert_eq!(closed["data"]["deleted_audio"], false);

        let status = post_json(&router, "/api/session/status", json!({ "session_id": session_id })).await;
        assert_eq!(status["errno"], 404);
    }
}
