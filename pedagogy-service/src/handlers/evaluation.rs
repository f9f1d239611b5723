use crate::dtos::{
    timestamp, BackgroundEvaluationRequest, BackgroundEvaluationResponse, EvaluationAccepted,
    EvaluationRequest, EvaluationStatusParams, EvaluationStatusResponse,
};
use crate::middleware::{UserId, ValidatedJson};
use crate::models::work_history::EVALUATION_MODULE;
use crate::models::NewWorkRecord;
use crate::startup::AppState;
use crate::workers::{new_job_id, EnqueueError, EvaluationJob};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

const STATUS_ENDPOINT: &str = "/api/evaluacion-status";
const ESTIMATED_TIME: &str = "2-5 minutos";

fn input_data(request: &EvaluationRequest) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(request)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode job input: {}", e)))
}

/// Accept an evaluation job and hand it to the worker pool.
///
/// Once the pending row exists the answer is always 202; enqueue failures
/// are written to the row for the client to find when polling.
#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<EvaluationRequest>,
) -> Result<(StatusCode, Json<EvaluationAccepted>), AppError> {
    let job_id = new_job_id();

    state
        .history
        .insert(NewWorkRecord::pending(
            job_id.clone(),
            user.0.clone(),
            EVALUATION_MODULE,
            input_data(&request)?,
        ))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, job_id = %job_id, "Failed to create evaluation job");
            AppError::from(e)
        })?;

    let job = EvaluationJob {
        job_id: job_id.clone(),
        request,
    };

    let enqueued = match &state.jobs {
        Some(queue) => queue.enqueue(job),
        None => Err(EnqueueError::Closed),
    };

    match enqueued {
        Ok(()) => tracing::info!(job_id = %job_id, "Evaluation job queued"),
        Err(e) => {
            tracing::warn!(error = %e, job_id = %job_id, "Evaluation job could not be queued");
            if let Err(store_err) = state.history.mark_error(&job_id, &e.to_string()).await {
                tracing::error!(error = %store_err, job_id = %job_id, "Failed to record enqueue failure");
            }
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(EvaluationAccepted {
            success: true,
            message: "Evaluación iniciada para procesamiento en background".to_string(),
            status_endpoint: format!("{}?id={}", STATUS_ENDPOINT, job_id),
            job_id,
            estimated_time: ESTIMATED_TIME.to_string(),
            timestamp: timestamp(),
        }),
    ))
}

/// Run a named job to completion within the request.
#[tracing::instrument(skip(state, request), fields(user_id = %user.0, job_id = %request.job_id))]
pub async fn run_evaluation(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<BackgroundEvaluationRequest>,
) -> Result<Json<BackgroundEvaluationResponse>, AppError> {
    let BackgroundEvaluationRequest { job_id, evaluation } = request;

    match state.history.find_by_job_id(&job_id).await? {
        Some(record) if record.status.is_terminal() => {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Job {} already finished with status {}",
                job_id,
                record.status
            )));
        }
        Some(_) => {}
        None => {
            state
                .history
                .insert(NewWorkRecord::pending(
                    job_id.clone(),
                    user.0.clone(),
                    EVALUATION_MODULE,
                    input_data(&evaluation)?,
                ))
                .await?;
        }
    }

    let record = state
        .processor
        .process(&EvaluationJob {
            job_id,
            request: evaluation,
        })
        .await?;

    Ok(Json(BackgroundEvaluationResponse {
        success: true,
        result: record.result_text().unwrap_or_default().to_string(),
        status: record.status,
        job_id: record.job_id,
        timestamp: timestamp(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn evaluation_status(
    State(state): State<AppState>,
    Query(params): Query<EvaluationStatusParams>,
) -> Result<Json<EvaluationStatusResponse>, AppError> {
    let job_id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("id is required"))?;

    let record = state
        .history
        .find_by_job_id(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found: {}", job_id)))?;

    Ok(Json(record.into()))
}
