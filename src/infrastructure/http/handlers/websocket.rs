//! WebSocket Handler
//!
//! 每个会话一个连接，推送运行事件（状态、脚本片段、音频就绪、失败）

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::application::ports::SessionManagerPort;
use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// Session WebSocket 连接处理
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

async fn handle_session_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 验证会话存在
    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    // 注册事件接收器
    let mut event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "WebSocket connected");

    let session_id_for_forward = session_id.clone();
    let session_id_for_receive = session_id.clone();
    let sessions_for_forward = state.session_manager.clone();

    // 事件转发任务
    let mut forward_task = tokio::spawn(async move {
        while let Some(event) = next_event(
            &mut event_rx,
            sessions_for_forward.as_ref(),
            &session_id_for_forward,
        )
        .await
        {
            let closing = matches!(event, WsEvent::SessionClosed { .. });
            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    session_id = %session_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }

            if closing {
                let _ = sender.close().await;
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let session_manager = state.session_manager.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {
                    session_manager.touch(&session_id_for_receive);
                }
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}

/// 取下一个要推送的事件，通道结束时返回 None
///
/// 落后丢失事件时改发当前会话快照（`Resync`）
async fn next_event(
    event_rx: &mut broadcast::Receiver<WsEvent>,
    session_manager: &dyn SessionManagerPort,
    session_id: &str,
) -> Option<WsEvent> {
    match event_rx.recv().await {
        Ok(event) => Some(event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(
                session_id = %session_id,
                skipped = skipped,
                "WebSocket client lagging, sending resync"
            );
            session_manager
                .get(session_id)
                .ok()
                .map(|session| WsEvent::resync(&session))
        }
        Err(RecvError::Closed) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{RunEventSink, Session};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemorySessionManager;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_lagging_receiver_gets_resync() {
        let sessions = InMemorySessionManager::new();
        let publisher = EventPublisher::new();
        let session_id = sessions.create(Session::new()).unwrap();
        let mut rx = publisher.register_session(&session_id);
        let run_id = Uuid::new_v4();

        for index in 0..300 {
            publisher.fragment(&session_id, run_id, index, "x");
        }

        match next_event(&mut rx, &sessions, &session_id).await {
            Some(WsEvent::Resync { session_id: id, .. }) => assert_eq!(id, session_id),
            other => panic!("unexpected event: {:?}", other),
        }
        // 快照之后继续推送缓冲中的事件
        assert!(matches!(
            next_event(&mut rx, &sessions, &session_id).await,
            Some(WsEvent::Fragment { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_channel_ends_forwarding() {
        let sessions = InMemorySessionManager::new();
        let publisher = EventPublisher::new();
        let session_id = sessions.create(Session::new()).unwrap();
        let mut rx = publisher.register_session(&session_id);

        publisher.session_closed(&session_id, "closed by client");
        assert!(matches!(
            next_event(&mut rx, &sessions, &session_id).await,
            Some(WsEvent::SessionClosed { .. })
        ));
        assert!(next_event(&mut rx, &sessions, &session_id).await.is_none());
    }
}
