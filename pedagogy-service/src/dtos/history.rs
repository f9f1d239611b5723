use crate::models::WorkRecord;
use crate::services::providers::ModelInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

impl HistoryParams {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub items: Vec<WorkRecord>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    #[serde(rename = "availableModels")]
    pub available_models: Vec<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        let params = |limit| HistoryParams {
            user_id: None,
            limit,
        };
        assert_eq!(params(None).limit(), 50);
        assert_eq!(params(Some(0)).limit(), 1);
        assert_eq!(params(Some(-5)).limit(), 1);
        assert_eq!(params(Some(500)).limit(), 100);
        assert_eq!(params(Some(20)).limit(), 20);
    }
}
