//! 申诉实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::appeals::entities::Appeal;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appeals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub submission_id: i64,
    pub student_id: i64,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub documents: Option<String>,
    pub decided_by: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub decision_note: Option<String>,
    pub created_at: i64,
    pub decided_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_appeal(self) -> std::result::Result<Appeal, AssessmentError> {
        Ok(Appeal {
            id: self.id,
            submission_id: self.submission_id,
            student_id: self.student_id,
            status: self.status.parse().map_err(AssessmentError::serialization)?,
            reason: self.reason,
            documents: self
                .documents
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            decided_by: self.decided_by,
            decision_note: self.decision_note,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            decided_at: self
                .decided_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
        })
    }
}
