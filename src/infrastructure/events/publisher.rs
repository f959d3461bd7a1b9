//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现，同时是工作流的 RunEventSink

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::{RunEventSink, Session};
use crate::domain::podcast::RunState;

/// 每个会话通道的缓冲容量
const CHANNEL_CAPACITY: usize = 256;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 会话状态变更
    StateChanged {
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<Uuid>,
        state: RunState,
    },
    /// 新的脚本片段
    Fragment {
        session_id: String,
        run_id: Uuid,
        index: usize,
        text: String,
    },
    /// 运行失败
    RunFailed {
        session_id: String,
        run_id: Uuid,
        error: String,
    },
    /// 音频可播放
    AudioReady {
        session_id: String,
        run_id: Uuid,
        size_bytes: u64,
        url: String,
        download_url: String,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
    /// 客户端落后、事件被丢弃后的完整快照
    ///
    /// `script` 含前 `fragment_count` 个片段，之后收到的 `index` 更小的片段可忽略
    Resync {
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<Uuid>,
        state: RunState,
        script: String,
        fragment_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl WsEvent {
    pub fn resync(session: &Session) -> Self {
        WsEvent::Resync {
            session_id: session.id.clone(),
            run_id: session.run.as_ref().map(|run| run.run_id),
            state: session.state,
            script: session.script.as_str().to_string(),
            fragment_count: session.script.fragment_count(),
            error: session.error.clone(),
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            session_channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        self.session_channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl RunEventSink for EventPublisher {
    fn state_changed(&self, session_id: &str, run_id: Option<Uuid>, state: RunState) {
        self.publish_to_session(
            session_id,
            WsEvent::StateChanged {
                session_id: session_id.to_string(),
                run_id,
                state,
            },
        );
    }

    fn fragment(&self, session_id: &str, run_id: Uuid, index: usize, text: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::Fragment {
                session_id: session_id.to_string(),
                run_id,
                index,
                text: text.to_string(),
            },
        );
    }

    fn run_failed(&self, session_id: &str, run_id: Uuid, error: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::RunFailed {
                session_id: session_id.to_string(),
                run_id,
                error: error.to_string(),
            },
        );
    }

    fn audio_ready(&self, session_id: &str, run_id: Uuid, size_bytes: u64) {
        self.publish_to_session(
            session_id,
            WsEvent::AudioReady {
                session_id: session_id.to_string(),
                run_id,
                size_bytes,
                url: format!("/api/audio/{}", session_id),
                download_url: format!("/api/audio/{}/download", session_id),
            },
        );
    }

    /// 发布后移除通道，订阅者收完缓冲的事件后结束
    fn session_closed(&self, session_id: &str, reason: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::SessionClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
        self.unregister_session(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscriber_in_order() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_session("s1");
        let run_id = Uuid::new_v4();

        publisher.state_changed("s1", Some(run_id), RunState::Generating);
        publisher.fragment("s1", run_id, 0, "Hello");
        publisher.fragment("s1", run_id, 1, " world");
        // 其它会话的事件不会收到
        publisher.fragment("s2", run_id, 0, "other");

        assert!(matches!(
            rx.recv().await.unwrap(),
            WsEvent::StateChanged { state: RunState::Generating, .. }
        ));
        assert!(matches!(rx.recv().await.unwrap(), WsEvent::Fragment { index: 0, .. }));
        match rx.recv().await.unwrap() {
            WsEvent::Fragment { index, text, .. } => {
                assert_eq!(index, 1);
                assert_eq!(text, " world");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_closed_ends_channel() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_session("s1");

        publisher.session_closed("s1", "expired");
        assert!(matches!(rx.recv().await.unwrap(), WsEvent::SessionClosed { .. }));
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(!publisher.session_channels.contains_key("s1"));
    }

    #[test]
    fn test_event_wire_format() {
        let event = WsEvent::StateChanged {
            session_id: "s1".to_string(),
            run_id: None,
            state: RunState::ScriptReady,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "StateChanged");
        assert_eq!(json["data"]["state"], "script_ready");
        assert!(json["data"].get("run_id").is_none());
    }

    #[test]
    fn test_resync_carries_script_so_far() {
        let mut session = Session::new();
        session.state = RunState::Generating;
        session.script.push("Hello");
        session.script.push(" world");

        let json = serde_json::to_value(WsEvent::resync(&session)).unwrap();
        assert_eq!(json["event"], "Resync");
        assert_eq!(json["data"]["session_id"], session.id.as_str());
        assert_eq!(json["data"]["state"], "generating");
        assert_eq!(json["data"]["script"], "Hello world");
        assert_eq!(json["data"]["fragment_count"], 2);
        assert!(json["data"].get("error").is_none());
    }
}
