use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse, response::Response};
use service_core::error::AppError;

/// Replaces the router's bare 405 with the JSON error body, keeping `Allow`.
pub async fn json_method_not_allowed(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(axum::http::header::ALLOW).cloned();
    let mut replaced = AppError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        replaced
            .headers_mut()
            .insert(axum::http::header::ALLOW, allow);
    }
    replaced
}
