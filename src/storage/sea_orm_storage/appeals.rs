//! 申诉存储操作

use super::SeaOrmStorage;
use crate::entity::appeals::{ActiveModel, Column, Entity as Appeals};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::appeals::entities::{Appeal, AppealStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

impl SeaOrmStorage {
    /// 创建申诉；同一提交的第二条申诉被唯一索引拦截为 Conflict
    pub async fn create_appeal_impl(
        &self,
        student_id: i64,
        submission_id: i64,
        reason: String,
        documents: Option<Vec<String>>,
    ) -> Result<Appeal> {
        let model = ActiveModel {
            submission_id: Set(submission_id),
            student_id: Set(student_id),
            status: Set(AppealStatus::Pending.to_string()),
            reason: Set(reason),
            documents: Set(documents.as_ref().map(serde_json::to_string).transpose()?),
            decided_by: Set(None),
            decision_note: Set(None),
            created_at: Set(chrono::Utc::now().timestamp()),
            decided_at: Set(None),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_err("创建申诉失败", e))?;

        result.try_into_appeal()
    }

    /// 通过 ID 获取申诉
    pub async fn get_appeal_by_id_impl(&self, id: i64) -> Result<Option<Appeal>> {
        let result = Appeals::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询申诉失败: {e}")))?;

        result.map(|m| m.try_into_appeal()).transpose()
    }

    /// 通过提交 ID 获取申诉
    pub async fn get_appeal_by_submission_impl(&self, submission_id: i64) -> Result<Option<Appeal>> {
        let result = Appeals::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询申诉失败: {e}")))?;

        result.map(|m| m.try_into_appeal()).transpose()
    }

    /// 裁决申诉
    ///
    /// 只对 pending 的申诉生效，第二次裁决拿到 Validation 错误。
    /// 批准且需要时在同一事务里清除提交的迟交标记。
    pub async fn decide_appeal_impl(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        decided_by: i64,
        decision_note: Option<String>,
        clear_late_flag: bool,
    ) -> Result<Appeal> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        let updated = Appeals::update_many()
            .col_expr(
                Column::Status,
                sea_orm::sea_query::Expr::value(status.to_string()),
            )
            .col_expr(
                Column::DecidedBy,
                sea_orm::sea_query::Expr::value(Some(decided_by)),
            )
            .col_expr(
                Column::DecisionNote,
                sea_orm::sea_query::Expr::value(decision_note),
            )
            .col_expr(Column::DecidedAt, sea_orm::sea_query::Expr::value(Some(now)))
            .filter(Column::Id.eq(appeal_id))
            .filter(Column::Status.eq(AppealStatus::Pending.to_string()))
            .exec(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("裁决申诉失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(AssessmentError::validation(format!(
                "申诉 {appeal_id} 不存在或已裁决"
            )));
        }

        if clear_late_flag {
            let appeal = Appeals::find_by_id(appeal_id)
                .one(&txn)
                .await
                .map_err(|e| AssessmentError::database_operation(format!("回查申诉失败: {e}")))?
                .ok_or_else(|| AssessmentError::database_operation("申诉更新后不存在"))?;

            Submissions::update_many()
                .col_expr(
                    SubmissionColumn::IsLate,
                    sea_orm::sea_query::Expr::value(false),
                )
                .filter(SubmissionColumn::Id.eq(appeal.submission_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    AssessmentError::database_operation(format!("清除迟交标记失败: {e}"))
                })?;
        }

        let appeal = Appeals::find_by_id(appeal_id)
            .one(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("回查申诉失败: {e}")))?
            .ok_or_else(|| AssessmentError::database_operation("申诉更新后不存在"))?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        appeal.try_into_appeal()
    }
}
