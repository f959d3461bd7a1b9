//! Gemini Document Stager - 临时文件 + Files API 上传

use async_trait::async_trait;
use std::sync::Arc;

use super::client::GeminiClient;
use crate::application::ports::{DocumentHandle, DocumentStagerPort, StagingError};
use crate::domain::podcast::UploadedDocument;
use crate::infrastructure::adapters::storage::TempFileStore;

/// Gemini Document Stager
pub struct GeminiDocumentStager {
    client: Arc<GeminiClient>,
    temp_files: Arc<TempFileStore>,
}

impl GeminiDocumentStager {
    pub fn new(client: Arc<GeminiClient>, temp_files: Arc<TempFileStore>) -> Self {
        Self { client, temp_files }
    }

    async fn remove_quietly(&self, path: &std::path::Path) {
        if let Err(e) = self.temp_files.remove(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove temp document"
            );
        }
    }
}

#[async_trait]
impl DocumentStagerPort for GeminiDocumentStager {
    async fn stage(&self, document: &UploadedDocument) -> Result<DocumentHandle, StagingError> {
        let local_path = self
            .temp_files
            .write(document.bytes())
            .await
            .map_err(|e| StagingError::StorageError(e.to_string()))?;

        let uploaded = match self
            .client
            .upload_file(&local_path, document.media_type(), document.display_name())
            .await
        {
            Ok(file) => file,
            Err(e) => {
                // 上传失败不会有生成请求，临时文件直接删除
                self.remove_quietly(&local_path).await;
                return Err(e);
            }
        };

        Ok(DocumentHandle {
            uri: uploaded.uri,
            mime_type: uploaded
                .mime_type
                .unwrap_or_else(|| document.media_type().to_string()),
            remote_name: Some(uploaded.name),
            local_path,
        })
    }

    async fn release(&self, handle: &DocumentHandle) -> Result<(), StagingError> {
        self.temp_files
            .remove(&handle.local_path)
            .await
            .map_err(|e| StagingError::StorageError(e.to_string()))?;

        tracing::debug!(path = %handle.local_path.display(), "Temp document released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::gemini::GeminiClientConfig;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_failure_removes_temp_file() {
        let dir = tempdir().unwrap();
        let temp_files = Arc::new(TempFileStore::new(dir.path()).await.unwrap());
        // 无人监听的端口，连接必然失败
        let client = GeminiClient::new(
            GeminiClientConfig::new("key").with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let stager = GeminiDocumentStager::new(Arc::new(client), temp_files);

        let document = UploadedDocument::new(
            Bytes::from_static(b"%PDF-1.4"),
            Some("application/pdf"),
            Some("doc.pdf"),
        )
        .unwrap();

        let err = stager.stage(&document).await.unwrap_err();
        assert!(matches!(err, StagingError::UpstreamError(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
