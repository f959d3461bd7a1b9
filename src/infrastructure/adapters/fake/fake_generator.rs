//! Fake Script Generator - 返回预设的脚本片段

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::lock;
use crate::application::ports::{
    FragmentStream, GenerationError, GenerationMode, GenerationRequest, ScriptGeneratorPort,
};

/// dry-run 使用的示例脚本
const SAMPLE_SCRIPT: &[&str] = &[
    "Welcome to the show. ",
    "Today we are looking at a document you shared with us, ",
    "and we will walk through its main ideas one at a time. ",
    "This is a dry run, so no real model was asked to read it. ",
    "Thanks for listening, and see you next time.",
];

/// Fake Script Generator
pub struct FakeScriptGenerator {
    fragments: Vec<String>,
    /// 输出 N 个片段后中断
    fail_after: Option<usize>,
    /// 每个片段前的延迟
    delay: Duration,
    calls: AtomicUsize,
    last_instruction: Mutex<Option<String>>,
    last_mode: Mutex<Option<GenerationMode>>,
}

impl FakeScriptGenerator {
    pub fn new(fragments: Vec<String>) -> Self {
        Self {
            fragments,
            fail_after: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
            last_mode: Mutex::new(None),
        }
    }

    /// dry-run 模式：示例脚本，片段间有短暂延迟
    pub fn sample() -> Self {
        Self::new(SAMPLE_SCRIPT.iter().map(|s| s.to_string()).collect())
            .with_delay(Duration::from_millis(150))
    }

    pub fn failing_after(mut self, fragments: usize) -> Self {
        self.fail_after = Some(fragments);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_instruction(&self) -> Option<String> {
        lock(&self.last_instruction).clone()
    }

    pub fn last_mode(&self) -> Option<GenerationMode> {
        *lock(&self.last_mode)
    }
}

#[async_trait]
impl ScriptGeneratorPort for FakeScriptGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<FragmentStream, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_instruction) = Some(request.instruction.as_str().to_string());
        *lock(&self.last_mode) = Some(request.mode);

        tracing::debug!(
            uri = %request.document.uri,
            mode = ?request.mode,
            "FakeScriptGenerator: returning preset fragments"
        );

        let items: Vec<Result<String, GenerationError>> = match (request.mode, self.fail_after) {
            (GenerationMode::Whole, Some(_)) => {
                return Err(GenerationError::ServiceError(
                    "simulated generation failure".to_string(),
                ))
            }
            (GenerationMode::Whole, None) => vec![Ok(self.fragments.concat())],
            (GenerationMode::Streaming, fail_after) => {
                let take = fail_after.unwrap_or(self.fragments.len());
                let mut items: Vec<_> = self.fragments.iter().take(take).cloned().map(Ok).collect();
                if fail_after.is_some() {
                    items.push(Err(GenerationError::NetworkError(
                        "simulated stream interruption".to_string(),
                    )));
                }
                items
            }
        };

        let delay = self.delay;
        Ok(stream::iter(items)
            .then(move |item| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                item
            })
            .boxed())
    }
}
