//! Gemini Client - 调用 Google Generative Language REST API
//!
//! 实现 ScriptGeneratorPort
//!
//! - 文件上传：`POST {base}/upload/v1beta/files`（resumable，start 后 upload + finalize）
//! - 生成：`POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse`
//!   或 `:generateContent`
//!
//! 认证头 `x-goog-api-key`

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;

use super::stream::fragment_stream;
use super::types::{
    Content, ErrorEnvelope, FileData, FileUploadMetadata, FileUploadStart, GenerateContentRequest,
    GenerateContentResponse, Part, RemoteFile, UploadedFileResponse,
};
use crate::application::ports::{
    FragmentStream, GenerationError, GenerationMode, GenerationRequest, ScriptGeneratorPort,
    StagingError,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    /// API 基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 请求超时时间（秒），0 表示不设置
    pub timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-pro".to_string(),
            timeout_secs: 0,
        }
    }
}

impl GeminiClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url())
    }

    fn generate_url(&self, mode: GenerationMode) -> String {
        let action = match mode {
            GenerationMode::Streaming => "streamGenerateContent?alt=sse",
            GenerationMode::Whole => "generateContent",
        };
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url(),
            self.config.model,
            action
        )
    }

    fn api_key(&self) -> &str {
        self.config.api_key.trim()
    }

    /// 构造请求体：文档引用在前，指令在后
    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::FileData {
                        file_data: FileData {
                            mime_type: request.document.mime_type.clone(),
                            file_uri: request.document.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: request.instruction.as_str().to_string(),
                    },
                ],
            }],
        }
    }

    /// 上传本地文件到 Files API
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, StagingError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| StagingError::StorageError(e.to_string()))?;
        let upstream = |e: reqwest::Error| StagingError::UpstreamError(describe(&e));

        // 1. 开始上传，获取上传地址
        let start = self
            .client
            .post(self.upload_url())
            .header(API_KEY_HEADER, self.api_key())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&FileUploadStart {
                file: FileUploadMetadata { display_name },
            })
            .send()
            .await
            .map_err(upstream)?;
        let start = check_status(start)
            .await
            .map_err(|e| StagingError::UpstreamError(e.to_string()))?;

        let session_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| {
                StagingError::UpstreamError("Upload session URL missing from response".to_string())
            })?;

        // 2. 上传内容并结束
        let size = data.len();
        let finish = self
            .client
            .post(&session_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await
            .map_err(upstream)?;
        let finish = check_status(finish)
            .await
            .map_err(|e| StagingError::UpstreamError(e.to_string()))?;

        let uploaded: UploadedFileResponse = finish.json().await.map_err(|e| {
            StagingError::UpstreamError(format!("Invalid upload response: {}", e))
        })?;

        tracing::info!(
            name = %uploaded.file.name,
            uri = %uploaded.file.uri,
            state = ?uploaded.file.state,
            size = size,
            "File uploaded to Gemini"
        );

        Ok(uploaded.file)
    }
}

#[async_trait]
impl ScriptGeneratorPort for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<FragmentStream, GenerationError> {
        let url = self.generate_url(request.mode);
        let body = Self::build_request(&request);

        tracing::debug!(
            model = %self.config.model,
            mode = ?request.mode,
            file_uri = %request.document.uri,
            instruction_len = request.instruction.as_str().len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key())
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;
        let response = check_status(response).await?;

        match request.mode {
            GenerationMode::Streaming => Ok(fragment_stream(response.bytes_stream().boxed())),
            GenerationMode::Whole => {
                let body: GenerateContentResponse = response.json().await.map_err(|e| {
                    GenerationError::InvalidResponse(format!("Failed to parse response: {}", e))
                })?;
                let text = body.into_text()?;

                let fragments: Vec<Result<String, GenerationError>> = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Ok(text)]
                };
                Ok(stream::iter(fragments).boxed())
            }
        }
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Cannot connect to Gemini API: {}", e)
    } else {
        e.to_string()
    }
}

fn map_request_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::NetworkError(describe(&e))
    }
}

/// 非 2xx 时读取错误信息
async fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|envelope| envelope.error.to_string())
        .unwrap_or(text);

    Err(GenerationError::ServiceError(format!(
        "HTTP {}: {}",
        status, message
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DocumentHandle;
    use crate::domain::podcast::Instruction;
    use axum::{
        extract::Path as UrlPath,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use std::path::PathBuf;

    fn handle(uri: &str) -> DocumentHandle {
        DocumentHandle {
            uri: uri.to_string(),
            mime_type: "application/pdf".to_string(),
            remote_name: Some("files/abc".to_string()),
            local_path: PathBuf::from("/tmp/abc.pdf"),
        }
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(GeminiClientConfig::new("test-key").with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client("https://example.com/");
        assert_eq!(
            client.generate_url(GenerationMode::Streaming),
            "https://example.com/v1beta/models/gemini-1.5-pro:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            client.generate_url(GenerationMode::Whole),
            "https://example.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(client.upload_url(), "https://example.com/upload/v1beta/files");
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest {
            document: handle("https://files/abc"),
            instruction: Instruction::compose(Some("Keep it short")),
            mode: GenerationMode::Streaming,
        };
        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["fileData"]["fileUri"], "https://files/abc");
        assert_eq!(parts[0]["fileData"]["mimeType"], "application/pdf");
        assert!(parts[1]["text"].as_str().unwrap().ends_with("\nKeep it short"));
    }

    const SSE_BODY: &str = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Welcome \"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"to the show.\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\r\n\r\n",
    );

    /// 本地模拟的 Gemini 服务
    async fn mock_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let session_url = format!("{}/upload-session/1", base);

        let app = Router::new()
            .route(
                "/upload/v1beta/files",
                post(move |headers: HeaderMap| {
                    let session_url = session_url.clone();
                    async move {
                        assert_eq!(headers["x-goog-api-key"], "test-key");
                        assert_eq!(headers["x-goog-upload-command"], "start");
                        ([(UPLOAD_URL_HEADER, session_url)], "")
                    }
                }),
            )
            .route(
                "/upload-session/1",
                post(|headers: HeaderMap, body: axum::body::Bytes| async move {
                    assert_eq!(headers["x-goog-upload-command"], "upload, finalize");
                    assert!(body.starts_with(b"%PDF"));
                    Json(serde_json::json!({
                        "file": {
                            "name": "files/abc123",
                            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                            "mimeType": "application/pdf",
                            "state": "ACTIVE"
                        }
                    }))
                }),
            )
            .route(
                "/v1beta/models/:target",
                post(|UrlPath(target): UrlPath<String>| async move {
                    match target.as_str() {
                        "gemini-1.5-pro:streamGenerateContent" => {
                            ([("content-type", "text/event-stream")], SSE_BODY).into_response()
                        }
                        "gemini-1.5-pro:generateContent" => Json(serde_json::json!({
                            "candidates": [{"content": {"parts": [{"text": "Welcome to the show."}]}}]
                        }))
                        .into_response(),
                        _ => (
                            StatusCode::NOT_FOUND,
                            Json(serde_json::json!({
                                "error": {"code": 404, "message": "model not found", "status": "NOT_FOUND"}
                            })),
                        )
                            .into_response(),
                    }
                }),
            );

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    async fn generate_text(client: &GeminiClient, mode: GenerationMode) -> Vec<String> {
        let request = GenerationRequest {
            document: handle("https://files/abc123"),
            instruction: Instruction::base(),
            mode,
        };
        client
            .generate(request)
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_resumable_upload() {
        let base = mock_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let file = client(&base)
            .upload_file(&path, "application/pdf", "doc.pdf")
            .await
            .unwrap();
        assert_eq!(file.name, "files/abc123");
        assert!(file.uri.ends_with("files/abc123"));
    }

    #[tokio::test]
    async fn test_streaming_matches_whole() {
        let base = mock_server().await;
        let client = client(&base);

        let streamed = generate_text(&client, GenerationMode::Streaming).await;
        let whole = generate_text(&client, GenerationMode::Whole).await;

        assert_eq!(streamed, vec!["Welcome ", "to the show."]);
        assert_eq!(whole.len(), 1);
        assert_eq!(streamed.concat(), whole.concat());
    }

    #[tokio::test]
    async fn test_service_error_status() {
        let base = mock_server().await;
        let client = GeminiClient::new(
            GeminiClientConfig::new("test-key")
                .with_base_url(&base)
                .with_model("missing-model"),
        )
        .unwrap();

        let request = GenerationRequest {
            document: handle("https://files/abc123"),
            instruction: Instruction::base(),
            mode: GenerationMode::Streaming,
        };
        match client.generate(request).await {
            Err(GenerationError::ServiceError(message)) => {
                assert!(message.contains("NOT_FOUND"));
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected an error"),
        }
    }
}
