use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 申诉状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Pending,
    Approved,
    Denied,
}

impl AppealStatus {
    /// 申诉裁决为单次有效，已裁决的申诉不可再次裁决
    pub fn is_decided(&self) -> bool {
        !matches!(self, AppealStatus::Pending)
    }
}

impl std::fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppealStatus::Pending => write!(f, "pending"),
            AppealStatus::Approved => write!(f, "approved"),
            AppealStatus::Denied => write!(f, "denied"),
        }
    }
}

impl std::str::FromStr for AppealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppealStatus::Pending),
            "approved" => Ok(AppealStatus::Approved),
            "denied" => Ok(AppealStatus::Denied),
            _ => Err(format!("Invalid appeal status: {s}")),
        }
    }
}

/// 迟交裁定申诉，每个提交最多一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appeal {
    pub id: i64,
    pub submission_id: i64,
    pub student_id: i64,
    pub status: AppealStatus,
    pub reason: String,
    // 佐证材料的对象存储引用路径
    pub documents: Option<Vec<String>>,
    pub decided_by: Option<i64>,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}
