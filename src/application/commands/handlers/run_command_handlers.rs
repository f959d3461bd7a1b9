//! Run Command Handlers - 播客生成工作流
//!
//! 上传 → 暂存 → 生成（片段流）→ 合成 → 音频产物
//!
//! 同一进程内同一时间只执行一次运行（run gate），生成与合成严格串行

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::session_command_handlers::discard_artifact;
use crate::application::commands::run_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioArtifact, AudioStoragePort, DocumentHandle, DocumentStagerPort, GenerationMode,
    GenerationRequest, RunContext, RunEventSink, ScriptGeneratorPort, SessionManagerPort,
    SynthesisRequest, VoiceSynthesizerPort,
};
use crate::domain::podcast::{
    ArtifactToken, Instruction, PodcastError, RunState, ScriptText, SynthesisParams,
};
use crate::domain::voice::{self, VoiceProfile};

/// 工作流选项
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// 生成响应模式
    pub mode: GenerationMode,
    /// 脚本就绪后是否等待确认再合成
    pub require_confirmation: bool,
    /// 请求未指定音色时使用
    pub default_voice: VoiceProfile,
    /// 同时执行的运行数
    pub max_concurrent_runs: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Streaming,
            require_confirmation: false,
            default_voice: *voice::default_voice(),
            max_concurrent_runs: 1,
        }
    }
}

/// ExecuteRun Handler - 固化运行上下文并进入 Generating
///
/// 只做校验和状态迁移，实际执行由 `PodcastWorkflow::run` 完成
pub struct ExecuteRunHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
    events: Arc<dyn RunEventSink>,
    options: WorkflowOptions,
}

impl ExecuteRunHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        events: Arc<dyn RunEventSink>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            session_manager,
            audio_storage,
            events,
            options,
        }
    }

    pub async fn handle(&self, cmd: ExecuteRunCommand) -> Result<RunContext, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;

        if session.state.is_busy() {
            return Err(ApplicationError::invalid_state(format!(
                "Session {} already has a run in progress ({})",
                cmd.session_id, session.state
            )));
        }

        let document = session
            .document
            .clone()
            .ok_or_else(|| ApplicationError::validation("No PDF document uploaded"))?;

        // 音色：名称或 ID，缺省用默认音色
        let voice = match cmd.voice.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(selection) => *voice::resolve(selection).ok_or_else(|| {
                ApplicationError::validation(format!("Unknown voice: {}", selection))
            })?,
            None => self.options.default_voice,
        };

        // 请求中的追加内容优先于已保存的
        let addendum = cmd.addendum.or(session.addendum);
        let instruction = Instruction::compose(addendum.as_deref());

        let run = RunContext::new(
            cmd.session_id.clone(),
            document,
            instruction,
            voice,
            self.options.mode,
        );

        let previous = self.session_manager.begin_run(&cmd.session_id, run.clone())?;
        if let Some(artifact) = previous {
            discard_artifact(self.audio_storage.as_ref(), &artifact).await;
        }

        self.events
            .state_changed(&cmd.session_id, Some(run.run_id), RunState::Generating);

        tracing::info!(
            session_id = %cmd.session_id,
            run_id = %run.run_id,
            voice_id = %run.voice.voice_id,
            mode = ?run.mode,
            custom_instruction = !run.instruction.is_base(),
            "Podcast run started"
        );

        Ok(run)
    }
}

/// 播客工作流
pub struct PodcastWorkflow {
    session_manager: Arc<dyn SessionManagerPort>,
    stager: Arc<dyn DocumentStagerPort>,
    generator: Arc<dyn ScriptGeneratorPort>,
    synthesizer: Arc<dyn VoiceSynthesizerPort>,
    audio_storage: Arc<dyn AudioStoragePort>,
    events: Arc<dyn RunEventSink>,
    require_confirmation: bool,
    run_gate: Semaphore,
}

impl PodcastWorkflow {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        stager: Arc<dyn DocumentStagerPort>,
        generator: Arc<dyn ScriptGeneratorPort>,
        synthesizer: Arc<dyn VoiceSynthesizerPort>,
        audio_storage: Arc<dyn AudioStoragePort>,
        events: Arc<dyn RunEventSink>,
        options: &WorkflowOptions,
    ) -> Self {
        Self {
            session_manager,
            stager,
            generator,
            synthesizer,
            audio_storage,
            events,
            require_confirmation: options.require_confirmation,
            run_gate: Semaphore::new(options.max_concurrent_runs.max(1)),
        }
    }

    /// 执行一次运行（调用前会话已处于 Generating）
    pub async fn run(&self, run: RunContext) -> Result<RunOutcome, ApplicationError> {
        let _permit = self.acquire_gate().await?;

        let script = match self.generate_script(&run).await {
            Ok(script) => script,
            Err(e) => {
                self.abort(&run, &e);
                return Err(e);
            }
        };

        self.enter(&run, RunState::ScriptReady)?;
        tracing::info!(
            session_id = %run.session_id,
            run_id = %run.run_id,
            fragments = script.fragment_count(),
            script_len = script.as_str().len(),
            "Script ready"
        );

        // ScriptReady → Synthesizing 自动衔接（除非配置为需要确认）
        match RunState::after_script_ready(self.require_confirmation) {
            RunState::Synthesizing => {
                self.enter(&run, RunState::Synthesizing)?;
                self.synthesize_script(&run, script).await
            }
            _ => Ok(RunOutcome::AwaitingConfirmation),
        }
    }

    /// 确认合成：ScriptReady → Synthesizing
    ///
    /// 返回继续执行所需的上下文和脚本，交给 `resume`
    pub fn confirm(
        &self,
        cmd: ConfirmSynthesisCommand,
    ) -> Result<(RunContext, ScriptText), ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;

        if session.state != RunState::ScriptReady {
            return Err(ApplicationError::invalid_state(format!(
                "Session {} is {}, nothing to confirm",
                cmd.session_id, session.state
            )));
        }
        let run = session
            .run
            .ok_or_else(|| ApplicationError::invalid_state("Session has no run to continue"))?;

        self.enter(&run, RunState::Synthesizing)?;
        Ok((run, session.script))
    }

    /// 确认后继续合成
    pub async fn resume(
        &self,
        run: RunContext,
        script: ScriptText,
    ) -> Result<RunOutcome, ApplicationError> {
        let _permit = self.acquire_gate().await?;
        self.synthesize_script(&run, script).await
    }

    async fn acquire_gate(&self) -> Result<SemaphorePermit<'_>, ApplicationError> {
        self.run_gate
            .acquire()
            .await
            .map_err(|e| ApplicationError::internal(format!("Run gate closed: {}", e)))
    }

    /// 暂存文档并消费片段流
    async fn generate_script(&self, run: &RunContext) -> Result<ScriptText, ApplicationError> {
        let handle = self.stager.stage(&run.document).await?;
        tracing::debug!(
            session_id = %run.session_id,
            uri = %handle.uri,
            "Document staged"
        );

        let request = GenerationRequest {
            document: handle.clone(),
            instruction: run.instruction.clone(),
            mode: run.mode,
        };
        let submitted = self.generator.generate(request).await;

        // 请求已交给生成服务，本地临时文件不再需要
        self.release_document(&handle).await;

        let mut fragments = submitted?;
        let mut script = ScriptText::new();

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            script.push(&fragment);
            let index = self
                .session_manager
                .append_fragment(&run.session_id, &fragment)?;
            self.events
                .fragment(&run.session_id, run.run_id, index, &fragment);
        }

        if script.is_empty() {
            return Err(PodcastError::EmptyScript.into());
        }

        Ok(script)
    }

    async fn synthesize_script(
        &self,
        run: &RunContext,
        script: ScriptText,
    ) -> Result<RunOutcome, ApplicationError> {
        match self.try_synthesize(run, &script).await {
            Ok(artifact) => Ok(RunOutcome::AudioReady(artifact)),
            Err(e) => {
                self.abort(run, &e);
                Err(e)
            }
        }
    }

    async fn try_synthesize(
        &self,
        run: &RunContext,
        script: &ScriptText,
    ) -> Result<AudioArtifact, ApplicationError> {
        let request = SynthesisRequest::new(
            script.as_str(),
            run.voice.voice_id,
            SynthesisParams::podcast(),
        )?;
        let token = ArtifactToken::new();

        tracing::info!(
            session_id = %run.session_id,
            run_id = %run.run_id,
            voice_id = %run.voice.voice_id,
            text_len = request.text().len(),
            token = %token,
            "Synthesizing podcast audio"
        );

        let chunks = self.synthesizer.synthesize(request).await?;
        let artifact = self.audio_storage.save_stream(&token, chunks).await?;

        if let Err(e) = self
            .session_manager
            .complete_audio(&run.session_id, artifact.clone())
        {
            // 会话已关闭或状态已变，产物无人引用
            discard_artifact(self.audio_storage.as_ref(), &artifact).await;
            return Err(e.into());
        }

        self.events
            .state_changed(&run.session_id, Some(run.run_id), RunState::AudioReady);
        self.events
            .audio_ready(&run.session_id, run.run_id, artifact.size_bytes);

        tracing::info!(
            session_id = %run.session_id,
            run_id = %run.run_id,
            size_bytes = artifact.size_bytes,
            path = %artifact.path.display(),
            "Podcast audio ready"
        );

        Ok(artifact)
    }

    async fn release_document(&self, handle: &DocumentHandle) {
        if let Err(e) = self.stager.release(handle).await {
            tracing::warn!(
                path = %handle.local_path.display(),
                error = %e,
                "Failed to release staged document"
            );
        }
    }

    fn enter(&self, run: &RunContext, state: RunState) -> Result<(), ApplicationError> {
        self.session_manager.transition(&run.session_id, state)?;
        self.events
            .state_changed(&run.session_id, Some(run.run_id), state);
        Ok(())
    }

    /// 终止运行：→ Failed，已收到的脚本保留
    fn abort(&self, run: &RunContext, error: &ApplicationError) {
        let message = error.to_string();

        tracing::error!(
            session_id = %run.session_id,
            run_id = %run.run_id,
            error = %message,
            "Podcast run failed"
        );

        if let Err(e) = self.session_manager.fail(&run.session_id, &message) {
            tracing::warn!(
                session_id = %run.session_id,
                error = %e,
                "Failed to record run failure"
            );
        }

        self.events
            .state_changed(&run.session_id, Some(run.run_id), RunState::Failed);
        self.events
            .run_failed(&run.session_id, run.run_id, &message);
    }
}
