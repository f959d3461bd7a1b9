//! Fake Document Stager - 只写本地临时文件，不上传

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::application::ports::{DocumentHandle, DocumentStagerPort, StagingError};
use crate::domain::podcast::UploadedDocument;
use crate::infrastructure::adapters::storage::TempFileStore;

/// Fake Document Stager
pub struct FakeDocumentStager {
    temp_files: Arc<TempFileStore>,
    /// 模拟上传失败
    fail_upload: bool,
    stage_calls: AtomicUsize,
    release_calls: AtomicUsize,
    staged: Mutex<Vec<PathBuf>>,
}

impl FakeDocumentStager {
    pub fn new(temp_files: Arc<TempFileStore>) -> Self {
        Self {
            temp_files,
            fail_upload: false,
            stage_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            staged: Mutex::new(Vec::new()),
        }
    }

    /// 每次上传都失败
    pub fn failing(temp_files: Arc<TempFileStore>) -> Self {
        Self {
            fail_upload: true,
            ..Self::new(temp_files)
        }
    }

    pub fn stage_calls(&self) -> usize {
        self.stage_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    /// 所有写过的临时文件路径
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        lock(&self.staged).clone()
    }
}

#[async_trait]
impl DocumentStagerPort for FakeDocumentStager {
    async fn stage(&self, document: &UploadedDocument) -> Result<DocumentHandle, StagingError> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);

        let local_path = self
            .temp_files
            .write(document.bytes())
            .await
            .map_err(|e| StagingError::StorageError(e.to_string()))?;
        lock(&self.staged).push(local_path.clone());

        if self.fail_upload {
            if let Err(e) = self.temp_files.remove(&local_path).await {
                tracing::warn!(path = %local_path.display(), error = %e, "Failed to remove temp document");
            }
            return Err(StagingError::UpstreamError(
                "simulated upload failure".to_string(),
            ));
        }

        let name = local_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        tracing::debug!(
            path = %local_path.display(),
            size = document.len(),
            "FakeDocumentStager: staged locally"
        );

        Ok(DocumentHandle {
            uri: format!("fake://files/{}", name),
            mime_type: document.media_type().to_string(),
            remote_name: Some(format!("files/{}", name)),
            local_path,
        })
    }

    async fn release(&self, handle: &DocumentHandle) -> Result<(), StagingError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.temp_files
            .remove(&handle.local_path)
            .await
            .map_err(|e| StagingError::StorageError(e.to_string()))
    }
}
