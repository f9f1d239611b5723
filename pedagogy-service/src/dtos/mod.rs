//! Request and response bodies for the HTTP API.
//!
//! Field names follow the JSON the web client already sends, which mixes
//! camelCase and snake_case.

mod evaluation;
mod export;
mod generation;
mod history;

pub use evaluation::{
    BackgroundEvaluationRequest, BackgroundEvaluationResponse, EvaluationAccepted,
    EvaluationRequest, EvaluationStatusMetadata, EvaluationStatusParams,
    EvaluationStatusResponse,
};
pub use export::{ExportParams, ExportRequest, ExportedDocument};
pub use generation::{
    BalanceRequest, BalanceResponse, BloomRequest, BloomResponse, ElevateDok3Request,
    ElevateDok3Response, QuestionsMetadata, QuestionsRequest, QuestionsResponse,
    RubricParameters, RubricRequest, RubricResponse,
};
pub use history::{HistoryParams, HistoryResponse, ModelsResponse};

use chrono::{SecondsFormat, Utc};

/// Current time as an ISO-8601 string with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
