use super::{HistoryError, StatusUpdate, WorkHistoryStore};
use crate::models::{JobStatus, NewWorkRecord, WorkRecord};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store for development and tests. Records are kept in
/// insertion order.
#[derive(Default)]
pub struct InMemoryWorkHistory {
    records: RwLock<Vec<WorkRecord>>,
}

impl InMemoryWorkHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkHistoryStore for InMemoryWorkHistory {
    async fn insert(&self, record: NewWorkRecord) -> Result<WorkRecord, HistoryError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.job_id == record.job_id) {
            return Err(HistoryError::Duplicate(record.job_id));
        }

        let now = Utc::now();
        let terminal = record.status.is_terminal();
        let stored = WorkRecord {
            id: Uuid::new_v4(),
            job_id: record.job_id,
            user_id: record.user_id,
            module_name: record.module_name,
            status: record.status,
            input_data: record.input_data,
            output_data: record.output_data,
            error_message: None,
            created_at: now,
            started_at: None,
            completed_at: terminal.then_some(now),
            updated_at: now,
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<WorkRecord>, HistoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.job_id == job_id).cloned())
    }

    async fn transition(
        &self,
        job_id: &str,
        update: StatusUpdate,
    ) -> Result<WorkRecord, HistoryError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.job_id == job_id)
            .ok_or_else(|| HistoryError::NotFound(job_id.to_string()))?;

        let target = update.target();
        if !record.status.can_transition_to(target) {
            return Err(HistoryError::InvalidTransition {
                job_id: job_id.to_string(),
                from: record.status,
                to: target,
            });
        }

        let now = Utc::now();
        match update {
            StatusUpdate::Processing => record.started_at = Some(now),
            StatusUpdate::Completed { output } => {
                record.output_data = Some(output);
                record.completed_at = Some(now);
            }
            StatusUpdate::Error { message } => {
                record.error_message = Some(message);
                record.completed_at = Some(now);
            }
        }
        record.status = target;
        record.updated_at = now;

        Ok(record.clone())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<WorkRecord>, HistoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}
