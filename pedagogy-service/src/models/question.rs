//! Questions produced for a learning objective.

use serde::{Deserialize, Serialize};

/// A single question and its Depth of Knowledge level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub pregunta: String,
    pub nivel_dok: u8,
}

/// Questions requested per DOK level, in the order the response reports them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuestionDistribution {
    pub dok1: u8,
    pub dok2: u8,
    pub dok3: u8,
}

impl QuestionDistribution {
    /// Two strategic-thinking questions, one skills question, one recall question.
    pub const STANDARD: QuestionDistribution = QuestionDistribution {
        dok1: 1,
        dok2: 1,
        dok3: 2,
    };

    pub fn total(&self) -> u8 {
        self.dok1 + self.dok2 + self.dok3
    }
}
