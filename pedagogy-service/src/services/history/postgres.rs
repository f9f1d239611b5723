use super::{HistoryError, StatusUpdate, WorkHistoryStore};
use crate::config::DatabaseConfig;
use crate::models::{JobStatus, NewWorkRecord, WorkRecord};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const COLUMNS: &str = "id, job_id, user_id, module_name, status, input_data, output_data, \
                       error_message, created_at, started_at, completed_at, updated_at";

#[derive(Debug, FromRow)]
struct WorkRecordRow {
    id: Uuid,
    job_id: String,
    user_id: String,
    module_name: String,
    status: String,
    input_data: serde_json::Value,
    output_data: Option<serde_json::Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkRecordRow> for WorkRecord {
    type Error = HistoryError;

    fn try_from(row: WorkRecordRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| HistoryError::Database(anyhow::anyhow!(e)))?;

        Ok(WorkRecord {
            id: row.id,
            job_id: row.job_id,
            user_id: row.user_id,
            module_name: row.module_name,
            status,
            input_data: row.input_data,
            output_data: row.output_data,
            error_message: row.error_message,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> HistoryError {
    HistoryError::Database(anyhow::anyhow!("{}: {}", context, e))
}

/// PostgreSQL-backed work history.
#[derive(Clone)]
pub struct PgWorkHistory {
    pool: PgPool,
}

impl PgWorkHistory {
    /// Create a new database connection pool.
    #[instrument(skip(config), fields(service = "pedagogy-service"))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, HistoryError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| db_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), HistoryError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| HistoryError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl WorkHistoryStore for PgWorkHistory {
    #[instrument(skip(self, record), fields(job_id = %record.job_id, module = %record.module_name))]
    async fn insert(&self, record: NewWorkRecord) -> Result<WorkRecord, HistoryError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_work_record"])
            .start_timer();

        let query = format!(
            r#"
            INSERT INTO user_work_history
                (id, job_id, user_id, module_name, status, input_data, output_data, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $8 THEN NOW() END)
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRecordRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&record.job_id)
            .bind(&record.user_id)
            .bind(&record.module_name)
            .bind(record.status.as_str())
            .bind(&record.input_data)
            .bind(&record.output_data)
            .bind(record.status.is_terminal())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    HistoryError::Duplicate(record.job_id.clone())
                }
                _ => db_error("Failed to insert work record", e),
            })?;

        timer.observe_duration();

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<WorkRecord>, HistoryError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_work_record"])
            .start_timer();

        let query = format!("SELECT {COLUMNS} FROM user_work_history WHERE job_id = $1");
        let row = sqlx::query_as::<_, WorkRecordRow>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch work record", e))?;

        timer.observe_duration();

        row.map(WorkRecord::try_from).transpose()
    }

    #[instrument(skip(self, update), fields(to = %update.target()))]
    async fn transition(
        &self,
        job_id: &str,
        update: StatusUpdate,
    ) -> Result<WorkRecord, HistoryError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_work_record"])
            .start_timer();

        let target = update.target();
        let allowed_from: Vec<String> = JobStatus::predecessors(target)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let (output, message) = match update {
            StatusUpdate::Processing => (None, None),
            StatusUpdate::Completed { output } => (Some(output), None),
            StatusUpdate::Error { message } => (None, Some(message)),
        };

        // The status guard in WHERE keeps the update atomic against
        // concurrent workers and pollers.
        let query = format!(
            r#"
            UPDATE user_work_history
            SET status = $2,
                started_at = CASE WHEN $2 = 'processing' THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $2 IN ('completed', 'error') THEN NOW() ELSE completed_at END,
                output_data = COALESCE($3, output_data),
                error_message = COALESCE($4, error_message),
                updated_at = NOW()
            WHERE job_id = $1 AND status = ANY($5)
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, WorkRecordRow>(&query)
            .bind(job_id)
            .bind(target.as_str())
            .bind(output)
            .bind(message)
            .bind(&allowed_from)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update work record", e))?;

        timer.observe_duration();

        match row {
            Some(row) => row.try_into(),
            None => match self.find_by_job_id(job_id).await? {
                Some(current) => Err(HistoryError::InvalidTransition {
                    job_id: job_id.to_string(),
                    from: current.status,
                    to: target,
                }),
                None => Err(HistoryError::NotFound(job_id.to_string())),
            },
        }
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<WorkRecord>, HistoryError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_work_records"])
            .start_timer();

        let query = format!(
            r#"
            SELECT {COLUMNS} FROM user_work_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, WorkRecordRow>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list work records", e))?;

        timer.observe_duration();

        rows.into_iter().map(WorkRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), HistoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Health check failed", e))?;
        Ok(())
    }
}
