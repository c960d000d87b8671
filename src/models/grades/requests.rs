use chrono::{DateTime, Utc};

use super::entities::GradeSourceType;

/// 成绩写入（按 (source_type, source_id, user_id) 幂等覆盖）
#[derive(Debug, Clone)]
pub struct GradeWrite {
    pub source_type: GradeSourceType,
    pub source_id: i64,
    pub user_id: i64,
    pub grader_id: Option<i64>,
    pub score: f64,
    pub max_score: f64,
    pub is_draft: bool,
    pub feedback: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
}
