use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 提交生命周期状态
//
// in_progress → submitted → {auto_graded | pending_manual_grading} → graded → released
// graded 可退回 pending_manual_grading（重新批改），但绝不回到 in_progress。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    InProgress,
    Submitted,
    AutoGraded,
    PendingManualGrading,
    Graded,
    Released,
}

impl SubmissionState {
    /// 是否为进行中（未交卷）状态
    pub fn is_open(&self) -> bool {
        matches!(self, SubmissionState::InProgress)
    }

    /// 非进行中的提交视为对前置要求的一次完成
    pub fn counts_as_completed(&self) -> bool {
        !self.is_open()
    }
}

impl<'de> Deserialize<'de> for SubmissionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的提交状态: '{s}'. 支持: in_progress, submitted, auto_graded, pending_manual_grading, graded, released"
            ))
        })
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionState::InProgress => write!(f, "in_progress"),
            SubmissionState::Submitted => write!(f, "submitted"),
            SubmissionState::AutoGraded => write!(f, "auto_graded"),
            SubmissionState::PendingManualGrading => write!(f, "pending_manual_grading"),
            SubmissionState::Graded => write!(f, "graded"),
            SubmissionState::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for SubmissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SubmissionState::InProgress),
            "submitted" => Ok(SubmissionState::Submitted),
            "auto_graded" => Ok(SubmissionState::AutoGraded),
            "pending_manual_grading" => Ok(SubmissionState::PendingManualGrading),
            "graded" => Ok(SubmissionState::Graded),
            "released" => Ok(SubmissionState::Released),
            _ => Err(format!("Invalid submission state: {s}")),
        }
    }
}

/// 一次提交（学生对某作业的一次尝试）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub state: SubmissionState,
    // 同一 (student, assignment) 下严格递增，重交删除旧行后仍不回退
    pub attempt_number: i32,
    pub is_late: bool,
    pub is_resubmission: bool,
    // 开卷时冻结的题目 ID 有序列表，本次作答只认这份题单
    pub question_set: Vec<i64>,
    pub score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// 派生的展示标签
    pub fn display_status(&self) -> String {
        if self.is_late {
            format!("{} (late)", self.state)
        } else {
            self.state.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            SubmissionState::InProgress,
            SubmissionState::Submitted,
            SubmissionState::AutoGraded,
            SubmissionState::PendingManualGrading,
            SubmissionState::Graded,
            SubmissionState::Released,
        ] {
            assert_eq!(state.to_string().parse::<SubmissionState>().unwrap(), state);
        }
    }

    #[test]
    fn test_completion_semantics() {
        assert!(!SubmissionState::InProgress.counts_as_completed());
        assert!(SubmissionState::Submitted.counts_as_completed());
        assert!(SubmissionState::Released.counts_as_completed());
    }
}
