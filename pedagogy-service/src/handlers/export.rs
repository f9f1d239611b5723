use crate::dtos::{ExportParams, ExportRequest, ExportedDocument};
use crate::middleware::ValidatedJson;
use crate::services::export::{ExportFormat, ExportedFile};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use service_core::error::AppError;

#[tracing::instrument(skip(state, request), fields(encoding = ?params.encoding))]
pub async fn export_docx(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
    ValidatedJson(request): ValidatedJson<ExportRequest>,
) -> Result<Response, AppError> {
    export(&state, ExportFormat::Docx, &params, &request).await
}

#[tracing::instrument(skip(state, request), fields(encoding = ?params.encoding))]
pub async fn export_pdf(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
    ValidatedJson(request): ValidatedJson<ExportRequest>,
) -> Result<Response, AppError> {
    export(&state, ExportFormat::Pdf, &params, &request).await
}

async fn export(
    state: &AppState,
    format: ExportFormat,
    params: &ExportParams,
    request: &ExportRequest,
) -> Result<Response, AppError> {
    let file = state
        .exporter
        .export(
            format,
            &request.html_content,
            request.title(),
            request.filename.as_deref(),
        )
        .await?;

    if params.wants_base64() {
        return Ok(Json(ExportedDocument {
            success: true,
            data: STANDARD.encode(&file.bytes),
            filename: file.filename,
            content_type: file.content_type.to_string(),
        })
        .into_response());
    }

    Ok(attachment(file))
}

fn attachment(file: ExportedFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}
