//! 成绩实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::grades::entities::Grade;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub source_type: String,
    pub source_id: i64,
    pub user_id: i64,
    pub grader_id: Option<i64>,
    pub score: f64,
    pub max_score: f64,
    pub is_draft: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub graded_at: i64,
    pub released_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_grade(self) -> std::result::Result<Grade, AssessmentError> {
        Ok(Grade {
            id: self.id,
            source_type: self
                .source_type
                .parse()
                .map_err(AssessmentError::serialization)?,
            source_id: self.source_id,
            user_id: self.user_id,
            grader_id: self.grader_id,
            score: self.score,
            max_score: self.max_score,
            is_draft: self.is_draft,
            feedback: self.feedback,
            graded_at: chrono::DateTime::from_timestamp(self.graded_at, 0).unwrap_or_default(),
            released_at: self
                .released_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
        })
    }
}
