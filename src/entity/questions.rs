//! 题目实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::questions::entities::Question;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub options: Option<String>,
    pub weight: f64,
    pub max_score: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub answer_key: Option<String>,
    pub position: i32,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_question(self) -> std::result::Result<Question, AssessmentError> {
        Ok(Question {
            id: self.id,
            assignment_id: self.assignment_id,
            kind: self.kind.parse().map_err(AssessmentError::serialization)?,
            prompt: self.prompt,
            options: self
                .options
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            weight: self.weight,
            max_score: self.max_score,
            answer_key: self
                .answer_key
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            position: self.position,
        })
    }
}
