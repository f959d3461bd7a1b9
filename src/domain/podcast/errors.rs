//! Podcast Context - Errors

use thiserror::Error;

use super::RunState;

#[derive(Debug, Error)]
pub enum PodcastError {
    #[error("上传的文档为空")]
    EmptyDocument,

    #[error("只接受 PDF 文件: {0}")]
    NotPdf(String),

    #[error("非法的状态迁移: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },

    #[error("脚本文本为空")]
    EmptyScript,
}
