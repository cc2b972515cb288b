use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::GradingCriteria;

fn default_weight() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CriteriaCreate {
    pub project_type_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_score: i32,
    #[serde(default = "default_weight")]
    pub weight: i32,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct CriteriaUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_score: Option<i32>,
    pub weight: Option<i32>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CriteriaListResponse {
    pub items: Vec<GradingCriteria>,
    pub total_max_score: i64,
}
