use super::record_generation;
use crate::dtos::{
    timestamp, ElevateDok3Request, ElevateDok3Response, QuestionsMetadata, QuestionsRequest,
    QuestionsResponse,
};
use crate::middleware::{UserId, ValidatedJson};
use crate::services::analysis::parse_questions;
use crate::services::generation::PedagogyModule;
use crate::services::prompts;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn elevate_to_dok3(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<ElevateDok3Request>,
) -> Result<Json<ElevateDok3Response>, AppError> {
    let module = PedagogyModule::ElevateDok3;
    let objetivo_dok3 = state
        .generation
        .generate(module, &prompts::elevate_to_dok3(&request))
        .await?;

    record_generation(
        &state,
        module,
        request.module_name.as_deref(),
        &user,
        &request,
        &objetivo_dok3,
    )
    .await;

    Ok(Json(ElevateDok3Response {
        success: true,
        objetivo_dok3,
        timestamp: timestamp(),
    }))
}

/// Four questions for one learning objective.
#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn generate_questions(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let module = PedagogyModule::Questions;
    let text = state
        .generation
        .generate(module, &prompts::questions_for_objective(&request))
        .await?;

    let preguntas = parse_questions(&text);

    record_generation(
        &state,
        module,
        request.module_name.as_deref(),
        &user,
        &request,
        &text,
    )
    .await;

    Ok(Json(QuestionsResponse {
        success: true,
        preguntas,
        metadata: QuestionsMetadata::for_request(&request),
        timestamp: timestamp(),
    }))
}
