use crate::models::{JobStatus, WorkRecord};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of an evaluation job, stored verbatim as the job's input data.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EvaluationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "titulo is required"))]
    pub titulo: String,
    #[serde(default)]
    #[validate(required(message = "objetivos is required"))]
    pub objetivos: Option<Vec<String>>,
    #[serde(default)]
    #[validate(length(min = 1, message = "contenido is required"))]
    pub contenido: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrucciones: Option<String>,
    #[serde(
        rename = "tiempoEstimado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tiempo_estimado: Option<String>,
    #[serde(
        rename = "instruccionesEspeciales",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub instrucciones_especiales: Option<String>,
}

impl EvaluationRequest {
    pub fn objectives(&self) -> &[String] {
        self.objetivos.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BackgroundEvaluationRequest {
    #[serde(rename = "jobID", default)]
    #[validate(length(min = 1, message = "jobID is required"))]
    pub job_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub evaluation: EvaluationRequest,
}

#[derive(Debug, Serialize)]
pub struct EvaluationAccepted {
    pub success: bool,
    pub message: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "statusEndpoint")]
    pub status_endpoint: String,
    #[serde(rename = "estimatedTime")]
    pub estimated_time: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct BackgroundEvaluationResponse {
    pub success: bool,
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobStatus,
    pub result: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationStatusParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationStatusMetadata {
    pub tipo: String,
    pub titulo: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub processing_time: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationStatusResponse {
    pub success: bool,
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub metadata: EvaluationStatusMetadata,
    pub timestamp: String,
}

impl From<WorkRecord> for EvaluationStatusResponse {
    fn from(record: WorkRecord) -> Self {
        let metadata = EvaluationStatusMetadata {
            tipo: "evaluacion".to_string(),
            titulo: record.input_str("titulo").map(str::to_string),
            started_at: record.started_at.map(|t| t.to_rfc3339()),
            completed_at: record.completed_at.map(|t| t.to_rfc3339()),
            processing_time: record.processing_time_ms(),
        };

        Self {
            success: true,
            result: record.result_text().map(str::to_string),
            error: record.error_message.clone(),
            status: record.status,
            job_id: record.job_id,
            metadata,
            timestamp: super::timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn empty_objectives_list_is_accepted() {
        let request: EvaluationRequest =
            serde_json::from_str(r#"{"titulo": "t", "objetivos": [], "contenido": "c"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.objectives().is_empty());
    }

    #[test]
    fn absent_objectives_fail_validation() {
        let request: EvaluationRequest =
            serde_json::from_str(r#"{"titulo": "t", "contenido": "c"}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn background_request_validates_nested_fields() {
        let request: BackgroundEvaluationRequest = serde_json::from_str(
            r#"{"jobID": "eval_1_abc", "titulo": "", "objetivos": ["o"], "contenido": "c"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: BackgroundEvaluationRequest = serde_json::from_str(
            r#"{"titulo": "t", "objetivos": ["o"], "contenido": "c"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn status_response_reads_result_and_title_from_record() {
        let now = Utc::now();
        let record = WorkRecord {
            id: Uuid::new_v4(),
            job_id: "eval_1_abcdefghi".to_string(),
            user_id: "anonymous".to_string(),
            module_name: "GenerarEvaluacion".to_string(),
            status: JobStatus::Completed,
            input_data: serde_json::json!({"titulo": "Fotosíntesis"}),
            output_data: Some(serde_json::json!({"result": "texto", "processing_time": 1200})),
            error_message: None,
            created_at: now,
            started_at: Some(now),
            completed_at: Some(now),
            updated_at: now,
        };

        let json = serde_json::to_value(EvaluationStatusResponse::from(record)).unwrap();
        assert_eq!(json["jobID"], "eval_1_abcdefghi");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["result"], "texto");
        assert!(json["error"].is_null());
        assert_eq!(json["metadata"]["titulo"], "Fotosíntesis");
        assert_eq!(json["metadata"]["tipo"], "evaluacion");
        assert_eq!(json["metadata"]["processing_time"], 1200);
    }
}
