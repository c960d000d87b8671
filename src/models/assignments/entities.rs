use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 批改结果可见性模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    Immediate, // 自动评分完成后立即可见
    Deferred,  // 评分完成后隐藏，等待教师统一放出
}

impl std::fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewMode::Immediate => write!(f, "immediate"),
            ReviewMode::Deferred => write!(f, "deferred"),
        }
    }
}

impl std::str::FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(ReviewMode::Immediate),
            "deferred" => Ok(ReviewMode::Deferred),
            _ => Err(format!("Invalid review mode: {s}")),
        }
    }
}

// 组卷随机化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomizationType {
    None,         // 按题目顺序
    Shuffle,      // 打乱顺序
    RandomSubset, // 从题库随机抽取子集
}

impl std::fmt::Display for RandomizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RandomizationType::None => write!(f, "none"),
            RandomizationType::Shuffle => write!(f, "shuffle"),
            RandomizationType::RandomSubset => write!(f, "random_subset"),
        }
    }
}

impl std::str::FromStr for RandomizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RandomizationType::None),
            "shuffle" => Ok(RandomizationType::Shuffle),
            "random_subset" => Ok(RandomizationType::RandomSubset),
            _ => Err(format!("Invalid randomization type: {s}")),
        }
    }
}

// 作业发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Draft,
    Published,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Draft => write!(f, "draft"),
            AssignmentStatus::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AssignmentStatus::Draft),
            "published" => Ok(AssignmentStatus::Published),
            _ => Err(format!("Invalid assignment status: {s}")),
        }
    }
}

/// 作业挂载层级（由 unit_id / lesson_id 推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentScope {
    Course,
    Unit,
    Lesson,
}

/// 作业
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub unit_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub title: String,
    pub max_score: f64,
    pub deadline_at: Option<DateTime<Utc>>,
    // 截止后的宽限窗口（分钟），窗口内提交不算迟交
    pub tolerance_minutes: i32,
    // None 表示不限次数
    pub max_attempts: Option<i32>,
    pub cooldown_minutes: i32,
    pub retake_enabled: bool,
    pub allow_late_submission: bool,
    pub review_mode: ReviewMode,
    pub time_limit_minutes: Option<i32>,
    pub randomization_type: RandomizationType,
    pub random_subset_count: Option<i32>,
    pub status: AssignmentStatus,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn scope(&self) -> AssignmentScope {
        if self.lesson_id.is_some() {
            AssignmentScope::Lesson
        } else if self.unit_id.is_some() {
            AssignmentScope::Unit
        } else {
            AssignmentScope::Course
        }
    }

    /// 当前时刻是否在发布窗口内
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        if self.status != AssignmentStatus::Published {
            return false;
        }
        if let Some(from) = self.available_from
            && now < from
        {
            return false;
        }
        if let Some(until) = self.available_until
            && now > until
        {
            return false;
        }
        true
    }

    /// 名义截止时间加上宽限窗口
    pub fn deadline_with_tolerance(&self) -> Option<DateTime<Utc>> {
        self.deadline_at
            .map(|d| d + chrono::Duration::minutes(self.tolerance_minutes as i64))
    }
}
