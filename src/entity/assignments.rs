//! 作业实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::assignments::entities::Assignment;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub unit_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub title: String,
    pub max_score: f64,
    pub deadline_at: Option<i64>,
    pub tolerance_minutes: i32,
    pub max_attempts: Option<i32>,
    pub cooldown_minutes: i32,
    pub retake_enabled: bool,
    pub allow_late_submission: bool,
    pub review_mode: String,
    pub time_limit_minutes: Option<i32>,
    pub randomization_type: String,
    pub random_subset_count: Option<i32>,
    pub status: String,
    pub available_from: Option<i64>,
    pub available_until: Option<i64>,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::overrides::Entity")]
    Overrides,
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::overrides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Overrides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_assignment(self) -> std::result::Result<Assignment, AssessmentError> {
        Ok(Assignment {
            id: self.id,
            course_id: self.course_id,
            unit_id: self.unit_id,
            lesson_id: self.lesson_id,
            title: self.title,
            max_score: self.max_score,
            deadline_at: self
                .deadline_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
            tolerance_minutes: self.tolerance_minutes,
            max_attempts: self.max_attempts,
            cooldown_minutes: self.cooldown_minutes,
            retake_enabled: self.retake_enabled,
            allow_late_submission: self.allow_late_submission,
            review_mode: self
                .review_mode
                .parse()
                .map_err(AssessmentError::serialization)?,
            time_limit_minutes: self.time_limit_minutes,
            randomization_type: self
                .randomization_type
                .parse()
                .map_err(AssessmentError::serialization)?,
            random_subset_count: self.random_subset_count,
            status: self.status.parse().map_err(AssessmentError::serialization)?,
            available_from: self
                .available_from
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
            available_until: self
                .available_until
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
            created_by: self.created_by,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
