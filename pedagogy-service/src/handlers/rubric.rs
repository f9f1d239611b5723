use super::record_generation;
use crate::dtos::{timestamp, RubricRequest, RubricResponse};
use crate::middleware::{UserId, ValidatedJson};
use crate::services::generation::PedagogyModule;
use crate::services::prompts;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

#[tracing::instrument(skip(state, request), fields(user_id = %user.0, niveles = request.levels()))]
pub async fn generate_rubric(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<RubricRequest>,
) -> Result<Json<RubricResponse>, AppError> {
    let module = PedagogyModule::Rubric;
    let rubric = state
        .generation
        .generate(module, &prompts::rubric(&request))
        .await?;

    record_generation(
        &state,
        module,
        request.module_name.as_deref(),
        &user,
        &request,
        &rubric,
    )
    .await;

    Ok(Json(RubricResponse {
        success: true,
        rubric,
        parameters: request.parameters(),
        timestamp: timestamp(),
    }))
}
