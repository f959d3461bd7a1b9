//! In-Memory Session Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{
    AudioArtifact, RunContext, Session, SessionError, SessionManagerPort,
};
use crate::domain::podcast::{ArtifactToken, RunState, ScriptText, UploadedDocument};

/// 内存会话管理器
///
/// 每次修改都在 DashMap 条目锁内完成，状态检查与迁移是原子的
pub struct InMemorySessionManager {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 在条目锁内修改会话
    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let result = f(&mut *session)?;
        session.last_activity = Utc::now();
        Ok(result)
    }
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 校验并执行状态迁移
fn move_to(session: &mut Session, next: RunState) -> Result<(), SessionError> {
    if !session.state.can_transition_to(next) {
        return Err(SessionError::InvalidTransition {
            session_id: session.id.clone(),
            from: session.state,
            to: next,
        });
    }

    tracing::debug!(
        session_id = %session.id,
        from = %session.state,
        to = %next,
        "Session state changed"
    );
    session.state = next;
    Ok(())
}

impl SessionManagerPort for InMemorySessionManager {
    fn create(&self, session: Session) -> Result<String, SessionError> {
        let session_id = session.id.clone();
        if self.sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists(session_id));
        }
        self.sessions.insert(session_id.clone(), session);
        tracing::info!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    fn get(&self, id: &str) -> Result<Session, SessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn attach_document(
        &self,
        id: &str,
        document: UploadedDocument,
    ) -> Result<Option<AudioArtifact>, SessionError> {
        self.with_session(id, |session| {
            move_to(session, RunState::DocumentUploaded)?;
            session.document = Some(document);
            session.script = ScriptText::new();
            session.error = None;
            Ok(session.artifact.take())
        })
    }

    fn save_addendum(&self, id: &str, addendum: Option<String>) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.addendum = addendum;
            Ok(())
        })
    }

    fn begin_run(&self, id: &str, run: RunContext) -> Result<Option<AudioArtifact>, SessionError> {
        self.with_session(id, |session| {
            move_to(session, RunState::Generating)?;
            session.run = Some(run);
            session.script = ScriptText::new();
            session.error = None;
            Ok(session.artifact.take())
        })
    }

    fn transition(&self, id: &str, state: RunState) -> Result<(), SessionError> {
        self.with_session(id, |session| move_to(session, state))
    }

    fn append_fragment(&self, id: &str, fragment: &str) -> Result<usize, SessionError> {
        self.with_session(id, |session| {
            if session.state != RunState::Generating {
                return Err(SessionError::InvalidOperation(format!(
                    "Cannot append script while {}",
                    session.state
                )));
            }
            Ok(session.script.push(fragment))
        })
    }

    fn complete_audio(&self, id: &str, artifact: AudioArtifact) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            move_to(session, RunState::AudioReady)?;
            session.artifact = Some(artifact);
            Ok(())
        })
    }

    fn fail(&self, id: &str, error: &str) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            move_to(session, RunState::Failed)?;
            session.error = Some(error.to_string());
            Ok(())
        })
    }

    fn take_artifact(&self, id: &str, token: &ArtifactToken) -> Result<AudioArtifact, SessionError> {
        self.with_session(id, |session| {
            if session.state != RunState::AudioReady {
                return Err(SessionError::InvalidOperation(format!(
                    "No audio to take while {}",
                    session.state
                )));
            }
            if session.artifact.as_ref().map(|a| a.token) != Some(*token) {
                return Err(SessionError::InvalidOperation(format!(
                    "Audio {} is no longer current",
                    token
                )));
            }
            move_to(session, RunState::Idle)?;
            session.document = None;
            session.run = None;
            session.script = ScriptText::new();
            session
                .artifact
                .take()
                .ok_or_else(|| SessionError::InvalidOperation("No audio to take".to_string()))
        })
    }

    fn is_valid(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    fn close(&self, id: &str) -> Result<Session, SessionError> {
        self.sessions
            .remove(id)
            .map(|(_, session)| {
                tracing::info!(session_id = %id, state = %session.state, "Session removed");
                session
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn close_if_idle(&self, id: &str) -> Result<Option<Session>, SessionError> {
        match self.sessions.remove_if(id, |_, session| !session.state.is_busy()) {
            Some((_, session)) => {
                tracing::info!(session_id = %id, state = %session.state, "Idle session removed");
                Ok(Some(session))
            }
            None if self.sessions.contains_key(id) => Ok(None),
            None => Err(SessionError::NotFound(id.to_string())),
        }
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.last_activity = Utc::now();
        }
    }

    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(idle_timeout_secs as i64);

        self.sessions
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                // 运行中的会话不回收
                if elapsed > timeout && !entry.state.is_busy() {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn list_all(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}
