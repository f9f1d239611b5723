use crate::dtos::{HistoryParams, HistoryResponse, ModelsResponse};
use crate::middleware::UserId;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

/// Most recent work for a user; `user_id` in the query wins over the header.
#[tracing::instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    user: UserId,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, AppError> {
    let user_id = params
        .user_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(&user.0);

    let items = state.history.list_for_user(user_id, params.limit()).await?;

    Ok(Json(HistoryResponse {
        success: true,
        count: items.len(),
        items,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let available_models = state.generation.provider().list_models().await?;

    Ok(Json(ModelsResponse {
        success: true,
        available_models,
    }))
}
