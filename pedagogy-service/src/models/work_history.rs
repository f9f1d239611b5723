//! Work history model.
//!
//! One row per generation. Evaluation jobs move through the status machine
//! below; synchronous generations are written directly as `completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Module name recorded for evaluation jobs.
pub const EVALUATION_MODULE: &str = "GenerarEvaluacion";

/// Lifecycle of a work record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Statuses only move forward: pending, then processing, then a terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Error)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
        )
    }

    /// Statuses a record may be in before moving to `next`.
    pub fn predecessors(next: JobStatus) -> &'static [JobStatus] {
        match next {
            Self::Pending => &[],
            Self::Processing => &[Self::Pending],
            Self::Completed | Self::Error => &[Self::Pending, Self::Processing],
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// A row of `user_work_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: Uuid,
    pub job_id: String,
    pub user_id: String,
    pub module_name: String,
    pub status: JobStatus,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WorkRecord {
    /// Generated text stored under `output_data.result`.
    pub fn result_text(&self) -> Option<&str> {
        self.output_data
            .as_ref()
            .and_then(|o| o.get("result"))
            .and_then(|r| r.as_str())
    }

    /// Processing time in milliseconds, when the worker recorded one.
    pub fn processing_time_ms(&self) -> Option<i64> {
        self.output_data
            .as_ref()
            .and_then(|o| o.get("processing_time"))
            .and_then(|t| t.as_i64())
    }

    /// A string field of the original request payload.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input_data.get(key).and_then(|v| v.as_str())
    }
}

/// Input for creating a work record.
#[derive(Debug, Clone)]
pub struct NewWorkRecord {
    pub job_id: String,
    pub user_id: String,
    pub module_name: String,
    pub status: JobStatus,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
}

impl NewWorkRecord {
    /// A job waiting for a worker.
    pub fn pending(
        job_id: impl Into<String>,
        user_id: impl Into<String>,
        module_name: impl Into<String>,
        input_data: serde_json::Value,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            user_id: user_id.into(),
            module_name: module_name.into(),
            status: JobStatus::Pending,
            input_data,
            output_data: None,
        }
    }

    /// A synchronous generation that already finished.
    pub fn completed(
        module_name: impl Into<String>,
        user_id: impl Into<String>,
        input_data: serde_json::Value,
        output_data: serde_json::Value,
    ) -> Self {
        let module_name = module_name.into();
        Self {
            job_id: format!("{}_{}", module_name, Uuid::new_v4()),
            user_id: user_id.into(),
            module_name,
            status: JobStatus::Completed,
            input_data,
            output_data: Some(output_data),
        }
    }
}
