//! Domain models for the pedagogy service.

pub mod question;
pub mod work_history;

pub use question::{GeneratedQuestion, QuestionDistribution};
pub use work_history::{JobStatus, NewWorkRecord, WorkRecord};
