use super::record_generation;
use crate::dtos::{timestamp, BalanceRequest, BalanceResponse, BloomRequest, BloomResponse};
use crate::middleware::{UserId, ValidatedJson};
use crate::services::analysis::DokStatistics;
use crate::services::generation::PedagogyModule;
use crate::services::prompts;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// Bloom taxonomy and DOK classification of a single item.
#[tracing::instrument(skip(state, request), fields(user_id = %user.0, kind = %request.kind()))]
pub async fn analyze_bloom(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<BloomRequest>,
) -> Result<Json<BloomResponse>, AppError> {
    let module = PedagogyModule::BloomAnalysis;
    let analysis = state
        .generation
        .generate(module, &prompts::bloom_analysis(&request))
        .await?;

    record_generation(
        &state,
        module,
        request.module_name.as_deref(),
        &user,
        &request,
        &analysis,
    )
    .await;

    Ok(Json(BloomResponse {
        success: true,
        analysis,
        timestamp: timestamp(),
    }))
}

/// DOK balance of a whole exam, with level mention counts.
#[tracing::instrument(skip(state, request), fields(user_id = %user.0, kind = %request.kind()))]
pub async fn analyze_balance(
    State(state): State<AppState>,
    user: UserId,
    ValidatedJson(request): ValidatedJson<BalanceRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let module = PedagogyModule::BalanceAnalysis;
    let analysis = state
        .generation
        .generate(module, &prompts::balance_analysis(&request))
        .await?;

    let statistics = DokStatistics::from_text(&analysis);

    record_generation(
        &state,
        module,
        request.module_name.as_deref(),
        &user,
        &request,
        &analysis,
    )
    .await;

    Ok(Json(BalanceResponse {
        success: true,
        analysis,
        statistics,
        kind: request.kind().to_string(),
        timestamp: timestamp(),
    }))
}
