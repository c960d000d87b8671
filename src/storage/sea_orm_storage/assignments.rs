//! 作业存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::errors::{AssessmentError, Result};
use crate::models::assignments::{
    entities::{Assignment, AssignmentStatus},
    requests::CreateAssignmentRequest,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建作业（初始为草稿状态）
    pub async fn create_assignment_impl(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            course_id: Set(req.course_id),
            unit_id: Set(req.unit_id),
            lesson_id: Set(req.lesson_id),
            title: Set(req.title),
            max_score: Set(req.max_score),
            deadline_at: Set(req.deadline_at.map(|d| d.timestamp())),
            tolerance_minutes: Set(req.tolerance_minutes),
            max_attempts: Set(req.max_attempts),
            cooldown_minutes: Set(req.cooldown_minutes),
            retake_enabled: Set(req.retake_enabled),
            allow_late_submission: Set(req.allow_late_submission),
            review_mode: Set(req.review_mode.to_string()),
            time_limit_minutes: Set(req.time_limit_minutes),
            randomization_type: Set(req.randomization_type.to_string()),
            random_subset_count: Set(req.random_subset_count),
            status: Set(AssignmentStatus::Draft.to_string()),
            available_from: Set(req.available_from.map(|d| d.timestamp())),
            available_until: Set(req.available_until.map(|d| d.timestamp())),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建作业失败: {e}")))?;

        result.try_into_assignment()
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询作业失败: {e}")))?;

        result.map(|m| m.try_into_assignment()).transpose()
    }

    /// 列出课程下全部作业
    pub async fn list_assignments_by_course_impl(&self, course_id: i64) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询课程作业失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_assignment())
            .collect()
    }

    /// 更新作业发布状态
    pub async fn update_assignment_status_impl(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Assignments::update_many()
            .col_expr(Column::Status, sea_orm::sea_query::Expr::value(status.to_string()))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新作业状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
