//! Run HTTP Handlers
//!
//! 运行在后台任务中执行，进度通过 Session WebSocket 推送

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ApplicationError, ConfirmSynthesisCommand, ExecuteRunCommand, RunOutcome,
};
use crate::domain::podcast::RunState;
use crate::infrastructure::http::dto::{
    ApiResponse, ExecuteRunRequest, RunStartedResponse, SessionIdRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 开始运行
pub async fn execute_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRunRequest>,
) -> Result<Json<ApiResponse<RunStartedResponse>>, ApiError> {
    let run = state
        .execute_run_handler
        .handle(ExecuteRunCommand {
            session_id: req.session_id,
            voice: req.voice,
            addendum: req.addendum,
        })
        .await?;

    let response = RunStartedResponse {
        session_id: run.session_id.clone(),
        run_id: run.run_id,
        state: RunState::Generating,
        voice: run.voice.label,
        voice_id: run.voice.voice_id,
    };

    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        let session_id = run.session_id.clone();
        let run_id = run.run_id;
        log_outcome(&session_id, run_id, workflow.run(run).await);
    });

    Ok(Json(ApiResponse::success(response)))
}

/// 确认合成
pub async fn confirm_synthesis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<RunStartedResponse>>, ApiError> {
    let (run, script) = state.workflow.confirm(ConfirmSynthesisCommand {
        session_id: req.session_id,
    })?;

    let response = RunStartedResponse {
        session_id: run.session_id.clone(),
        run_id: run.run_id,
        state: RunState::Synthesizing,
        voice: run.voice.label,
        voice_id: run.voice.voice_id,
    };

    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        let session_id = run.session_id.clone();
        let run_id = run.run_id;
        log_outcome(&session_id, run_id, workflow.resume(run, script).await);
    });

    Ok(Json(ApiResponse::success(response)))
}

fn log_outcome(
    session_id: &str,
    run_id: Uuid,
    outcome: Result<RunOutcome, ApplicationError>,
) {
    match outcome {
        Ok(RunOutcome::AudioReady(artifact)) => tracing::info!(
            session_id = %session_id,
            run_id = %run_id,
            size_bytes = artifact.size_bytes,
            "Run finished"
        ),
        Ok(RunOutcome::AwaitingConfirmation) => tracing::info!(
            session_id = %session_id,
            run_id = %run_id,
            "Run waiting for confirmation"
        ),
        Err(e) => tracing::warn!(
            session_id = %session_id,
            run_id = %run_id,
            error = %e,
            "Run failed"
        ),
    }
}
