//! 选课实体

use sea_orm::entity::prelude::*;

use crate::errors::AssessmentError;
use crate::models::enrollments::entities::Enrollment;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub status: String,
    pub joined_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务实体
    pub fn try_into_enrollment(self) -> std::result::Result<Enrollment, AssessmentError> {
        Ok(Enrollment {
            id: self.id,
            course_id: self.course_id,
            student_id: self.student_id,
            status: self.status.parse().map_err(AssessmentError::serialization)?,
            joined_at: chrono::DateTime::from_timestamp(self.joined_at, 0).unwrap_or_default(),
        })
    }
}
