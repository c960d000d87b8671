//! 豁免实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::overrides::entities::Override;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "overrides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub granted_by: i64,
    pub granted_at: i64,
    pub expires_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_override(self) -> std::result::Result<Override, AssessmentError> {
        Ok(Override {
            id: self.id,
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            kind: self.kind.parse().map_err(AssessmentError::serialization)?,
            value: serde_json::from_str(&self.value)?,
            reason: self.reason,
            granted_by: self.granted_by,
            granted_at: chrono::DateTime::from_timestamp(self.granted_at, 0).unwrap_or_default(),
            expires_at: self
                .expires_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
        })
    }
}
