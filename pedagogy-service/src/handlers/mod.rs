//! HTTP handlers for the pedagogy service.

pub mod analysis;
pub mod evaluation;
pub mod export;
pub mod health;
pub mod history;
pub mod objectives;
pub mod rubric;

use crate::middleware::UserId;
use crate::models::NewWorkRecord;
use crate::services::generation::PedagogyModule;
use crate::startup::AppState;
use serde::Serialize;

/// Record a finished synchronous generation. Failures are logged only; the
/// caller already has its result.
async fn record_generation<T: Serialize>(
    state: &AppState,
    module: PedagogyModule,
    module_name: Option<&str>,
    user: &UserId,
    request: &T,
    result: &str,
) {
    let input = match serde_json::to_value(request) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize request for work history");
            return;
        }
    };

    let module_name = module_name
        .filter(|name| !name.is_empty())
        .unwrap_or(module.name());

    let record = NewWorkRecord::completed(
        module_name,
        user.0.clone(),
        input,
        serde_json::json!({ "result": result }),
    );

    if let Err(e) = state.history.insert(record).await {
        tracing::warn!(error = %e, module = module_name, "Failed to record work history");
    }
}
