//! 提交实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::submissions::entities::Submission;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub state: String,
    pub attempt_number: i32,
    pub is_late: bool,
    pub is_resubmission: bool,
    #[sea_orm(column_type = "Text")]
    pub question_set: String,
    pub score: Option<f64>,
    pub started_at: i64,
    pub submitted_at: Option<i64>,
    // in_progress 时为 Some(1)，其余为 None；唯一索引靠它限制单个进行中提交
    pub active: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(has_many = "super::answers::Entity")]
    Answers,
    #[sea_orm(has_one = "super::appeals::Entity")]
    Appeal,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::appeals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appeal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_submission(self) -> std::result::Result<Submission, AssessmentError> {
        Ok(Submission {
            id: self.id,
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            state: self.state.parse().map_err(AssessmentError::serialization)?,
            attempt_number: self.attempt_number,
            is_late: self.is_late,
            is_resubmission: self.is_resubmission,
            question_set: serde_json::from_str(&self.question_set)?,
            score: self.score,
            started_at: chrono::DateTime::from_timestamp(self.started_at, 0).unwrap_or_default(),
            submitted_at: self
                .submitted_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
        })
    }
}
