use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 选课状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Dropped,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentStatus::Active => write!(f, "active"),
            EnrollmentStatus::Dropped => write!(f, "dropped"),
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "dropped" => Ok(EnrollmentStatus::Dropped),
            _ => Err(format!("Invalid enrollment status: {s}")),
        }
    }
}

/// 选课记录，提交创建前用于资格校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub status: EnrollmentStatus,
    pub joined_at: DateTime<Utc>,
}
