//! 答案实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::answers::entities::Answer;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub selected_options: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub file_paths: Option<String>,
    pub score: Option<f64>,
    pub is_auto_graded: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id"
    )]
    Question,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_answer(self) -> std::result::Result<Answer, AssessmentError> {
        Ok(Answer {
            id: self.id,
            submission_id: self.submission_id,
            question_id: self.question_id,
            content: self.content,
            selected_options: self
                .selected_options
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            file_paths: self
                .file_paths
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            score: self.score,
            is_auto_graded: self.is_auto_graded,
            feedback: self.feedback,
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
