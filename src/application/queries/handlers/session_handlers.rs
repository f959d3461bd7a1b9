//! Session Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::SessionManagerPort;
use crate::application::queries::{GetSessionStatus, SessionStatus};

/// GetSessionStatus Handler
pub struct GetSessionStatusHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl GetSessionStatusHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, query: GetSessionStatus) -> Result<SessionStatus, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        self.session_manager.touch(&query.session_id);

        Ok(SessionStatus {
            session_id: session.id,
            state: session.state,
            file_name: session
                .document
                .as_ref()
                .and_then(|d| d.file_name().map(|f| f.to_string())),
            document_size: session.document.as_ref().map(|d| d.len()),
            addendum: session.addendum,
            run_id: session.run.as_ref().map(|r| r.run_id),
            voice: session.run.as_ref().map(|r| r.voice.label.to_string()),
            fragment_count: session.script.fragment_count(),
            script: session.script.into_string(),
            audio_size_bytes: session.artifact.as_ref().map(|a| a.size_bytes),
            error: session.error,
            created_at: session.created_at,
            last_activity: session.last_activity,
        })
    }
}
