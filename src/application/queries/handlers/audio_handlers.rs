//! Audio Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AudioArtifact, AudioStoragePort, SessionManagerPort};
use crate::application::queries::GetAudioQuery;
use crate::domain::podcast::RunState;

/// GetAudio Handler - 定位可播放的音频文件
pub struct GetAudioHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
}

impl GetAudioHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
    ) -> Self {
        Self {
            session_manager,
            audio_storage,
        }
    }

    pub async fn handle(&self, query: GetAudioQuery) -> Result<AudioArtifact, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        self.session_manager.touch(&query.session_id);

        let artifact = match (session.state, session.artifact) {
            (RunState::AudioReady, Some(artifact)) => artifact,
            _ => return Err(ApplicationError::not_found("Audio", &query.session_id)),
        };

        if !self.audio_storage.exists(&artifact).await {
            return Err(ApplicationError::not_found("Audio", artifact.token.to_string()));
        }

        Ok(artifact)
    }
}
