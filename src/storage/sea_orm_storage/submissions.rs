//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::answers::{Column as AnswerColumn, Entity as Answers};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::submissions::entities::{Submission, SubmissionState};
use crate::storage::NewSubmissionAttempt;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建新的提交尝试
    ///
    /// 重交时在同一事务里删除旧提交行及其答案。并发的第二个 start
    /// 会撞上 (assignment, student, active) 唯一索引，映射为 Conflict。
    pub async fn create_submission_attempt_impl(
        &self,
        attempt: NewSubmissionAttempt,
    ) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();
        let question_set = serde_json::to_string(&attempt.question_set)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        if let Some(old_id) = attempt.replace_submission_id {
            Answers::delete_many()
                .filter(AnswerColumn::SubmissionId.eq(old_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    AssessmentError::database_operation(format!("删除旧提交答案失败: {e}"))
                })?;

            Submissions::delete_by_id(old_id)
                .exec(&txn)
                .await
                .map_err(|e| AssessmentError::database_operation(format!("删除旧提交失败: {e}")))?;
        }

        let model = ActiveModel {
            assignment_id: Set(attempt.assignment_id),
            student_id: Set(attempt.student_id),
            state: Set(SubmissionState::InProgress.to_string()),
            attempt_number: Set(attempt.attempt_number),
            is_late: Set(false),
            is_resubmission: Set(attempt.is_resubmission),
            question_set: Set(question_set),
            score: Set(None),
            started_at: Set(now),
            submitted_at: Set(None),
            active: Set(Some(1)),
            ..Default::default()
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| Self::map_write_err("创建提交失败", e))?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        result.try_into_submission()
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.try_into_submission()).transpose()
    }

    /// 查找学生在某作业下进行中的提交
    pub async fn find_active_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Active.eq(1))
            .one(&self.db)
            .await
            .map_err(|e| {
                AssessmentError::database_operation(format!("查询进行中提交失败: {e}"))
            })?;

        result.map(|m| m.try_into_submission()).transpose()
    }

    /// 学生在某作业下的全部提交（按尝试序号倒序）
    pub async fn list_submissions_by_student_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>> {
        let results = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::AttemptNumber)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询提交列表失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_submission())
            .collect()
    }

    /// 交卷：仅对进行中的提交生效，同时释放 active 标记
    pub async fn finalize_submission_impl(
        &self,
        id: i64,
        submitted_at: DateTime<Utc>,
        is_late: bool,
    ) -> Result<Option<Submission>> {
        let result = Submissions::update_many()
            .col_expr(
                Column::State,
                sea_orm::sea_query::Expr::value(SubmissionState::Submitted.to_string()),
            )
            .col_expr(
                Column::SubmittedAt,
                sea_orm::sea_query::Expr::value(Some(submitted_at.timestamp())),
            )
            .col_expr(Column::IsLate, sea_orm::sea_query::Expr::value(is_late))
            .col_expr(
                Column::Active,
                sea_orm::sea_query::Expr::value(None::<i32>),
            )
            .filter(Column::Id.eq(id))
            .filter(Column::State.eq(SubmissionState::InProgress.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("交卷失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_submission_by_id_impl(id).await
    }

    /// 状态流转（评分、退回人工批改、放出成绩等）
    pub async fn set_submission_state_impl(
        &self,
        id: i64,
        state: SubmissionState,
    ) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(
                Column::State,
                sea_orm::sea_query::Expr::value(state.to_string()),
            )
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新提交状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 仅更新提交总分（答案键重算作业用）
    pub async fn update_submission_score_impl(&self, id: i64, score: f64) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::Score, sea_orm::sea_query::Expr::value(Some(score)))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新提交总分失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 清除迟交标记（申诉批准后）
    pub async fn clear_submission_late_flag_impl(&self, id: i64) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::IsLate, sea_orm::sea_query::Expr::value(false))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("清除迟交标记失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
