mod evaluation;
mod pool;

pub use evaluation::{new_job_id, EvaluationJob, EvaluationProcessor, JobError};
pub use pool::{EnqueueError, EvaluationWorkerPool, JobQueue};
