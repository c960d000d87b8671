//! 选课存储操作

use super::SeaOrmStorage;
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::errors::{AssessmentError, Result};
use crate::models::enrollments::entities::{Enrollment, EnrollmentStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 登记选课
    pub async fn create_enrollment_impl(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Enrollment> {
        let model = ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
            status: Set(EnrollmentStatus::Active.to_string()),
            joined_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_err("登记选课失败", e))?;

        result.try_into_enrollment()
    }

    /// 查找生效的选课记录
    pub async fn find_active_enrollment_impl(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询选课记录失败: {e}")))?;

        result.map(|m| m.try_into_enrollment()).transpose()
    }
}
