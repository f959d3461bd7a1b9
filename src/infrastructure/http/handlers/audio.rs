//! Audio Handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures_util::{future, stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{DownloadAudioCommand, DownloadedAudio, GetAudioQuery};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 播放音频（不消费，可重复请求）
pub async fn play_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state
        .get_audio_handler
        .handle(GetAudioQuery { session_id })
        .await?;

    let file = tokio::fs::File::open(&artifact.path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio: {}", e)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.mime_type)
        .header(header::CONTENT_LENGTH, artifact.size_bytes)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// 下载音频，响应体发送完毕后删除文件
///
/// 不设 Content-Length：响应体被读完才会执行删除，客户端中途断开时音频保留
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let DownloadedAudio {
        data,
        file_name,
        mime_type,
        artifact,
    } = state
        .download_audio_handler
        .handle(DownloadAudioCommand {
            session_id: session_id.clone(),
        })
        .await?;

    let payload = stream::once(future::ready(Ok::<_, Infallible>(Bytes::from(data))));
    let finish = stream::once(async move {
        if let Err(e) = state
            .download_audio_handler
            .finish(&session_id, &artifact)
            .await
        {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Downloaded audio was not consumed"
            );
        }
        None::<Result<Bytes, Infallible>>
    })
    .filter_map(future::ready);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from_stream(payload.chain(finish)))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
