use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 成绩来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeSourceType {
    Submission, // 单次提交的成绩
    Course,     // 课程层面的聚合成绩
}

impl std::fmt::Display for GradeSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeSourceType::Submission => write!(f, "submission"),
            GradeSourceType::Course => write!(f, "course"),
        }
    }
}

impl std::str::FromStr for GradeSourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submission" => Ok(GradeSourceType::Submission),
            "course" => Ok(GradeSourceType::Course),
            _ => Err(format!("Invalid grade source type: {s}")),
        }
    }
}

/// 成绩，按 (source_type, source_id, user_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub source_type: GradeSourceType,
    pub source_id: i64,
    pub user_id: i64,
    pub grader_id: Option<i64>,
    pub score: f64,
    pub max_score: f64,
    pub is_draft: bool,
    pub feedback: Option<String>,
    pub graded_at: DateTime<Utc>,
    // None 表示对学生不可见
    pub released_at: Option<DateTime<Utc>>,
}

impl Grade {
    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }
}
