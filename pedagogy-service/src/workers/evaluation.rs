use crate::dtos::EvaluationRequest;
use crate::models::WorkRecord;
use crate::services::generation::{GenerationService, PedagogyModule};
use crate::services::history::{HistoryError, WorkHistoryStore};
use crate::services::metrics::{EVALUATION_JOBS_IN_FLIGHT, EVALUATION_JOBS_TOTAL};
use crate::services::prompts;
use crate::services::providers::ProviderError;
use chrono::Utc;
use rand::Rng;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `eval_<unix millis>_<9 base36 chars>`.
pub fn new_job_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("eval_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone)]
pub struct EvaluationJob {
    pub job_id: String,
    pub request: EvaluationRequest,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Generation(#[from] ProviderError),
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::History(e) => e.into(),
            JobError::Generation(e) => e.into(),
        }
    }
}

/// Message stored on the job row when generation fails.
fn failure_message(err: &ProviderError) -> String {
    match err {
        ProviderError::NotConfigured(msg) => msg.clone(),
        other => other.to_string(),
    }
}

const CANCELLED_MESSAGE: &str = "Evaluation was cancelled before it finished";
const SHUTDOWN_MESSAGE: &str = "Service shut down before the job started";

/// Tracks a job between `processing` and its terminal state.
///
/// Dropping it unfinished marks the row as `error`, so a cancelled request
/// cannot leave the job stuck in `processing`.
struct InFlight {
    history: Arc<dyn WorkHistoryStore>,
    job_id: String,
    finished: bool,
}

impl InFlight {
    fn start(history: Arc<dyn WorkHistoryStore>, job_id: &str) -> Self {
        EVALUATION_JOBS_IN_FLIGHT.inc();
        Self {
            history,
            job_id: job_id.to_string(),
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        EVALUATION_JOBS_IN_FLIGHT.dec();
        if self.finished {
            return;
        }

        tracing::warn!(job_id = %self.job_id, "Evaluation job dropped while processing");
        EVALUATION_JOBS_TOTAL.with_label_values(&["cancelled"]).inc();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let history = self.history.clone();
        let job_id = std::mem::take(&mut self.job_id);
        runtime.spawn(async move {
            if let Err(e) = history.mark_error(&job_id, CANCELLED_MESSAGE).await {
                tracing::error!(job_id = %job_id, error = %e, "Failed to record cancelled evaluation job");
            }
        });
    }
}

/// Runs one evaluation job against its work-history row.
#[derive(Clone)]
pub struct EvaluationProcessor {
    generation: GenerationService,
    history: Arc<dyn WorkHistoryStore>,
}

impl EvaluationProcessor {
    pub fn new(generation: GenerationService, history: Arc<dyn WorkHistoryStore>) -> Self {
        Self {
            generation,
            history,
        }
    }

    /// Move the job to `processing`, generate, and record the outcome.
    ///
    /// A job whose row is missing or already past `pending` is left alone.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn process(&self, job: &EvaluationJob) -> Result<WorkRecord, JobError> {
        self.history.mark_processing(&job.job_id).await?;

        let in_flight = InFlight::start(self.history.clone(), &job.job_id);
        let start = Instant::now();
        let prompt = prompts::evaluation(&job.request);
        let generated = self
            .generation
            .generate(PedagogyModule::Evaluation, &prompt)
            .await;
        let elapsed_ms = start.elapsed().as_millis() as i64;
        in_flight.finish();

        match generated {
            Ok(text) => {
                let record = self
                    .history
                    .mark_completed(
                        &job.job_id,
                        serde_json::json!({
                            "result": text,
                            "processing_time": elapsed_ms,
                        }),
                    )
                    .await?;

                EVALUATION_JOBS_TOTAL.with_label_values(&["completed"]).inc();
                tracing::info!(duration_ms = elapsed_ms, "Evaluation job completed");
                Ok(record)
            }
            Err(e) => {
                let message = failure_message(&e);
                if let Err(store_err) = self.history.mark_error(&job.job_id, &message).await {
                    tracing::error!(error = %store_err, "Failed to record evaluation job failure");
                }

                EVALUATION_JOBS_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(error = %message, duration_ms = elapsed_ms, "Evaluation job failed");
                Err(e.into())
            }
        }
    }

    /// Fail a job that was accepted but never reached a worker.
    pub async fn abandon(&self, job: &EvaluationJob) {
        EVALUATION_JOBS_TOTAL.with_label_values(&["abandoned"]).inc();
        match self.history.mark_error(&job.job_id, SHUTDOWN_MESSAGE).await {
            Ok(_) => tracing::warn!(job_id = %job.job_id, "Evaluation job abandoned at shutdown"),
            Err(e) => {
                tracing::error!(job_id = %job.job_id, error = %e, "Failed to record abandoned evaluation job")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStatus, NewWorkRecord};
    use crate::services::history::InMemoryWorkHistory;
    use crate::services::providers::mock::MockTextProvider;
    use crate::services::providers::TextProvider;

    fn request() -> EvaluationRequest {
        serde_json::from_value(serde_json::json!({
            "titulo": "Prueba",
            "objetivos": ["OA1"],
            "contenido": "Células"
        }))
        .unwrap()
    }

    async fn setup(
        provider: impl TextProvider + 'static,
    ) -> (EvaluationProcessor, Arc<InMemoryWorkHistory>, EvaluationJob) {
        let history = Arc::new(InMemoryWorkHistory::new());
        let job = EvaluationJob {
            job_id: new_job_id(),
            request: request(),
        };
        history
            .insert(NewWorkRecord::pending(
                &job.job_id,
                "anonymous",
                "GenerarEvaluacion",
                serde_json::to_value(&job.request).unwrap(),
            ))
            .await
            .unwrap();
        let processor =
            EvaluationProcessor::new(GenerationService::new(Arc::new(provider)), history.clone());
        (processor, history, job)
    }

    #[test]
    fn job_ids_follow_the_eval_format() {
        let id = new_job_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "eval");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
        assert_ne!(new_job_id(), new_job_id());
    }

    #[tokio::test]
    async fn successful_job_stores_result_and_processing_time() {
        let (processor, history, job) =
            setup(MockTextProvider::with_response("Evaluación generada")).await;

        let record = processor.process(&job).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result_text(), Some("Evaluación generada"));
        assert!(record.processing_time_ms().is_some());
        assert!(record.started_at.is_some());

        let stored = history.find_by_job_id(&job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn missing_api_key_marks_job_error() {
        let (processor, history, job) = setup(MockTextProvider::new(false)).await;

        let err = processor.process(&job).await.unwrap_err();
        assert!(matches!(err, JobError::Generation(ProviderError::NotConfigured(_))));

        let stored = history.find_by_job_id(&job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.error_message.as_deref(), Some("API key not configured"));
    }

    #[tokio::test]
    async fn dropped_job_is_marked_error() {
        let provider =
            MockTextProvider::with_response("tarde").with_delay(std::time::Duration::from_millis(500));
        let (processor, history, job) = setup(provider).await;

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), processor.process(&job)).await;
        assert!(outcome.is_err());

        let mut stored = history.find_by_job_id(&job.job_id).await.unwrap().unwrap();
        for _ in 0..50 {
            if stored.status == JobStatus::Error {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            stored = history.find_by_job_id(&job.job_id).await.unwrap().unwrap();
        }
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    }

    #[tokio::test]
    async fn abandoned_job_is_marked_error() {
        let (processor, history, job) = setup(MockTextProvider::with_response("x")).await;

        processor.abandon(&job).await;

        let stored = history.find_by_job_id(&job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.error_message.as_deref(), Some(SHUTDOWN_MESSAGE));
    }

    #[tokio::test]
    async fn finished_job_is_not_processed_again() {
        let (processor, _history, job) = setup(MockTextProvider::with_response("x")).await;
        processor.process(&job).await.unwrap();

        let err = processor.process(&job).await.unwrap_err();
        assert!(matches!(
            err,
            JobError::History(HistoryError::InvalidTransition { .. })
        ));
    }
}
