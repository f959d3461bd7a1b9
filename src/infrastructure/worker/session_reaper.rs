//! Session Reaper - 过期会话回收

use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::handlers::CloseSessionHandler;
use crate::application::ports::SessionManagerPort;

/// Reaper 配置
#[derive(Debug, Clone)]
pub struct SessionReaperConfig {
    /// 扫描间隔（秒）
    pub interval_secs: u64,
    /// 空闲多久算过期（秒）
    pub session_expire_secs: u64,
}

impl Default for SessionReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            session_expire_secs: 3600,
        }
    }
}

/// 会话回收器
///
/// 定期关闭空闲过久的会话并删除它们的音频；运行中的会话不回收
pub struct SessionReaper {
    config: SessionReaperConfig,
    session_manager: Arc<dyn SessionManagerPort>,
    close_handler: Arc<CloseSessionHandler>,
}

impl SessionReaper {
    pub fn new(
        config: SessionReaperConfig,
        session_manager: Arc<dyn SessionManagerPort>,
        close_handler: Arc<CloseSessionHandler>,
    ) -> Self {
        Self {
            config,
            session_manager,
            close_handler,
        }
    }

    /// 启动 Reaper（直到任务被取消）
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            session_expire_secs = self.config.session_expire_secs,
            "SessionReaper started"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        // 第一次 tick 立即返回
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reaped = self.reap_once().await;
            if reaped > 0 {
                tracing::info!(reaped = reaped, "Expired sessions closed");
            }
        }
    }

    /// 执行一次回收，返回关闭的会话数
    pub async fn reap_once(&self) -> usize {
        let expired = self
            .session_manager
            .get_expired_sessions(self.config.session_expire_secs);

        let mut reaped = 0;
        for session_id in expired {
            match self.close_handler.close_expired(&session_id).await {
                Ok(Some(_)) => reaped += 1,
                Ok(None) => {
                    tracing::debug!(session_id = %session_id, "Expired session became busy, skip");
                }
                Err(e) => {
                    // 可能已被客户端关闭
                    tracing::debug!(session_id = %session_id, error = %e, "Skip expired session");
                }
            }
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Session;
    use crate::infrastructure::adapters::storage::FileAudioStorage;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemorySessionManager;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reaps_idle_sessions() {
        let dir = tempdir().unwrap();
        let sessions = Arc::new(InMemorySessionManager::new());
        let storage = Arc::new(FileAudioStorage::new(dir.path()).await.unwrap());
        let events = Arc::new(EventPublisher::new());
        let close_handler = Arc::new(CloseSessionHandler::new(
            sessions.clone(),
            storage,
            events.clone(),
        ));

        let stale = sessions.create(Session::new()).unwrap();
        let mut rx = events.register_session(&stale);

        let reaper = SessionReaper::new(
            SessionReaperConfig {
                interval_secs: 1,
                session_expire_secs: 3600,
            },
            sessions.clone(),
            close_handler.clone(),
        );
        // 尚未过期
        assert_eq!(reaper.reap_once().await, 0);
        assert!(sessions.is_valid(&stale));

        let reaper = SessionReaper::new(
            SessionReaperConfig {
                interval_secs: 1,
                session_expire_secs: 0,
            },
            sessions.clone(),
            close_handler,
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(reaper.reap_once().await, 1);
        assert!(!sessions.is_valid(&stale));
        assert!(matches!(
            rx.recv().await.unwrap(),
            crate::infrastructure::events::WsEvent::SessionClosed { .. }
        ));
    }

    #[tokio::test]
    async fn test_close_expired_keeps_busy_session() {
        use crate::application::ports::{GenerationMode, RunContext};
        use crate::domain::podcast::{Instruction, UploadedDocument};
        use crate::domain::voice;
        use bytes::Bytes;

        let dir = tempdir().unwrap();
        let sessions = Arc::new(InMemorySessionManager::new());
        let storage = Arc::new(FileAudioStorage::new(dir.path()).await.unwrap());
        let events = Arc::new(EventPublisher::new());
        let close_handler = CloseSessionHandler::new(sessions.clone(), storage, events);

        let id = sessions.create(Session::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(sessions.get_expired_sessions(0), vec![id.clone()]);

        // 扫描之后、关闭之前开始运行
        let pdf = UploadedDocument::new(
            Bytes::from_static(b"%PDF-1.4 test"),
            Some("application/pdf"),
            Some("a.pdf"),
        )
        .unwrap();
        sessions.attach_document(&id, pdf.clone()).unwrap();
        let run = RunContext::new(
            id.clone(),
            pdf,
            Instruction::base(),
            *voice::default_voice(),
            GenerationMode::Streaming,
        );
        sessions.begin_run(&id, run).unwrap();

        assert!(close_handler.close_expired(&id).await.unwrap().is_none());
        assert!(sessions.is_valid(&id));
    }
}
