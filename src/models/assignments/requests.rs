use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::{RandomizationType, ReviewMode};

/// 创建作业请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignmentRequest {
    pub course_id: i64,
    pub unit_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub title: String,
    pub max_score: f64,
    pub deadline_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tolerance_minutes: i32,
    pub max_attempts: Option<i32>,
    #[serde(default)]
    pub cooldown_minutes: i32,
    #[serde(default = "default_true")]
    pub retake_enabled: bool,
    #[serde(default)]
    pub allow_late_submission: bool,
    pub review_mode: ReviewMode,
    pub time_limit_minutes: Option<i32>,
    pub randomization_type: RandomizationType,
    pub random_subset_count: Option<i32>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}
