//! Session Command Handlers

use std::sync::Arc;

use crate::application::commands::session_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioArtifact, AudioStoragePort, RunEventSink, Session, SessionManagerPort,
};
use crate::domain::podcast::{RunState, UploadedDocument};

/// 下载文件名
pub const DOWNLOAD_FILE_NAME: &str = "podcast.mp3";

/// 删除不再被引用的音频产物，失败只记录
pub(crate) async fn discard_artifact(storage: &dyn AudioStoragePort, artifact: &AudioArtifact) {
    if let Err(e) = storage.delete(artifact).await {
        tracing::warn!(
            token = %artifact.token,
            path = %artifact.path.display(),
            error = %e,
            "Failed to delete audio artifact"
        );
    }
}

/// CreateSession Handler - 创建会话
pub struct CreateSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl CreateSessionHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, _cmd: CreateSessionCommand) -> Result<CreateSessionResponse, ApplicationError> {
        let session = Session::new();
        let state = session.state;
        let session_id = self.session_manager.create(session)?;

        Ok(CreateSessionResponse { session_id, state })
    }
}

/// UploadDocument Handler - 上传 PDF
pub struct UploadDocumentHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
    events: Arc<dyn RunEventSink>,
}

impl UploadDocumentHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        events: Arc<dyn RunEventSink>,
    ) -> Self {
        Self {
            session_manager,
            audio_storage,
            events,
        }
    }

    pub async fn handle(
        &self,
        cmd: UploadDocumentCommand,
    ) -> Result<UploadDocumentResponse, ApplicationError> {
        // 验证会话存在
        let session = self.session_manager.get(&cmd.session_id)?;
        if session.state.is_busy() {
            return Err(ApplicationError::invalid_state(format!(
                "Session {} is {}, wait for the current run to finish",
                cmd.session_id, session.state
            )));
        }

        // 验证文件类型
        let document = UploadedDocument::new(
            cmd.bytes,
            cmd.media_type.as_deref(),
            cmd.file_name.as_deref(),
        )?;
        let size_bytes = document.len();
        let file_name = document.file_name().map(|f| f.to_string());

        let replaced = self
            .session_manager
            .attach_document(&cmd.session_id, document)?;
        if let Some(artifact) = replaced {
            discard_artifact(self.audio_storage.as_ref(), &artifact).await;
        }

        self.events
            .state_changed(&cmd.session_id, None, RunState::DocumentUploaded);

        tracing::info!(
            session_id = %cmd.session_id,
            file_name = ?file_name,
            size_bytes = size_bytes,
            "Document uploaded"
        );

        Ok(UploadDocumentResponse {
            session_id: cmd.session_id,
            state: RunState::DocumentUploaded,
            file_name,
            size_bytes,
        })
    }
}

/// SaveAddendum Handler - 保存指令追加内容
pub struct SaveAddendumHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl SaveAddendumHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, cmd: SaveAddendumCommand) -> Result<(), ApplicationError> {
        let addendum = Some(cmd.addendum).filter(|a| !a.is_empty());
        self.session_manager
            .save_addendum(&cmd.session_id, addendum)?;

        tracing::debug!(session_id = %cmd.session_id, "Addendum saved");
        Ok(())
    }
}

/// CloseSession Handler - 关闭会话并删除音频
pub struct CloseSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
    events: Arc<dyn RunEventSink>,
}

impl CloseSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        events: Arc<dyn RunEventSink>,
    ) -> Self {
        Self {
            session_manager,
            audio_storage,
            events,
        }
    }

    pub async fn handle(
        &self,
        cmd: CloseSessionCommand,
    ) -> Result<CloseSessionResponse, ApplicationError> {
        self.close(&cmd.session_id, "closed by client").await
    }

    /// 关闭会话（客户端请求）
    pub async fn close(
        &self,
        session_id: &str,
        reason: &str,
    ) -> Result<CloseSessionResponse, ApplicationError> {
        let session = self.session_manager.close(session_id)?;
        Ok(self.finish_close(session_id, session, reason).await)
    }

    /// 关闭过期会话；会话已开始新的运行时保持不变并返回 None
    pub async fn close_expired(
        &self,
        session_id: &str,
    ) -> Result<Option<CloseSessionResponse>, ApplicationError> {
        match self.session_manager.close_if_idle(session_id)? {
            Some(session) => Ok(Some(self.finish_close(session_id, session, "expired").await)),
            None => Ok(None),
        }
    }

    async fn finish_close(
        &self,
        session_id: &str,
        session: Session,
        reason: &str,
    ) -> CloseSessionResponse {
        let deleted_audio = match &session.artifact {
            Some(artifact) => {
                discard_artifact(self.audio_storage.as_ref(), artifact).await;
                true
            }
            None => false,
        };

        self.events.session_closed(session_id, reason);

        tracing::info!(
            session_id = %session_id,
            reason = %reason,
            deleted_audio = deleted_audio,
            "Session closed"
        );

        CloseSessionResponse {
            session_id: session_id.to_string(),
            deleted_audio,
        }
    }
}

/// DownloadAudio Handler - 下载并删除音频
pub struct DownloadAudioHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
    events: Arc<dyn RunEventSink>,
}

impl DownloadAudioHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        events: Arc<dyn RunEventSink>,
    ) -> Self {
        Self {
            session_manager,
            audio_storage,
            events,
        }
    }

    /// 读取待下载的音频，会话保持 AudioReady
    pub async fn handle(&self, cmd: DownloadAudioCommand) -> Result<DownloadedAudio, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        let artifact = match (session.state, session.artifact) {
            (RunState::AudioReady, Some(artifact)) => artifact,
            _ => return Err(ApplicationError::not_found("Audio", &cmd.session_id)),
        };

        let data = self.audio_storage.read(&artifact).await?;

        Ok(DownloadedAudio {
            data,
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            mime_type: artifact.mime_type,
            artifact,
        })
    }

    /// 响应发送完毕后消费音频：删除文件，会话回到 Idle
    ///
    /// 并发下载只有一个能取走产物
    pub async fn finish(
        &self,
        session_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<(), ApplicationError> {
        let artifact = self.session_manager.take_artifact(session_id, &artifact.token)?;
        discard_artifact(self.audio_storage.as_ref(), &artifact).await;

        self.events.state_changed(session_id, None, RunState::Idle);

        tracing::info!(
            session_id = %session_id,
            size_bytes = artifact.size_bytes,
            "Podcast audio downloaded and removed"
        );
        Ok(())
    }
}
