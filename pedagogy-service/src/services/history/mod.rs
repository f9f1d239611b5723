//! Work history store.
//!
//! The `user_work_history` table doubles as the evaluation job queue's
//! source of truth: submitters, workers and pollers only meet through it.

mod memory;
mod postgres;

pub use memory::InMemoryWorkHistory;
pub use postgres::PgWorkHistory;

use crate::models::{JobStatus, NewWorkRecord, WorkRecord};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Job '{0}' not found")]
    NotFound(String),

    #[error("Job '{job_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            HistoryError::InvalidTransition { .. } | HistoryError::Duplicate(_) => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            HistoryError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

/// A status change and the data that comes with it.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Processing,
    Completed { output: serde_json::Value },
    Error { message: String },
}

impl StatusUpdate {
    pub fn target(&self) -> JobStatus {
        match self {
            Self::Processing => JobStatus::Processing,
            Self::Completed { .. } => JobStatus::Completed,
            Self::Error { .. } => JobStatus::Error,
        }
    }
}

#[async_trait]
pub trait WorkHistoryStore: Send + Sync {
    async fn insert(&self, record: NewWorkRecord) -> Result<WorkRecord, HistoryError>;

    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<WorkRecord>, HistoryError>;

    /// Apply `update` only if the record's current status allows it.
    async fn transition(
        &self,
        job_id: &str,
        update: StatusUpdate,
    ) -> Result<WorkRecord, HistoryError>;

    /// Most recent records first.
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<WorkRecord>, HistoryError>;

    async fn health_check(&self) -> Result<(), HistoryError>;

    async fn mark_processing(&self, job_id: &str) -> Result<WorkRecord, HistoryError> {
        self.transition(job_id, StatusUpdate::Processing).await
    }

    async fn mark_completed(
        &self,
        job_id: &str,
        output: serde_json::Value,
    ) -> Result<WorkRecord, HistoryError> {
        self.transition(job_id, StatusUpdate::Completed { output })
            .await
    }

    async fn mark_error(&self, job_id: &str, message: &str) -> Result<WorkRecord, HistoryError> {
        self.transition(
            job_id,
            StatusUpdate::Error {
                message: message.to_string(),
            },
        )
        .await
    }
}
