//! 答案存储操作

use super::SeaOrmStorage;
use crate::entity::answers::{ActiveModel, Column, Entity as Answers};
use crate::errors::{AssessmentError, Result};
use crate::models::answers::{entities::Answer, requests::AnswerScoreUpdate};
use crate::storage::AnswerWrite;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 记录答案，同一 (submission, question) 整体覆盖
    pub async fn upsert_answer_impl(
        &self,
        submission_id: i64,
        question_id: i64,
        write: AnswerWrite,
    ) -> Result<Answer> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            submission_id: Set(submission_id),
            question_id: Set(question_id),
            content: Set(write.content),
            selected_options: Set(write
                .selected_options
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?),
            file_paths: Set(write
                .file_paths
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?),
            score: Set(None),
            is_auto_graded: Set(false),
            feedback: Set(None),
            updated_at: Set(now),
            ..Default::default()
        };

        Answers::insert(model)
            .on_conflict(
                OnConflict::columns([Column::SubmissionId, Column::QuestionId])
                    .update_columns([
                        Column::Content,
                        Column::SelectedOptions,
                        Column::FilePaths,
                        Column::Score,
                        Column::IsAutoGraded,
                        Column::Feedback,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("记录答案失败: {e}")))?;

        let result = Answers::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .filter(Column::QuestionId.eq(question_id))
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("回查答案失败: {e}")))?
            .ok_or_else(|| AssessmentError::database_operation("答案写入后不存在"))?;

        result.try_into_answer()
    }

    /// 列出提交的全部答案
    pub async fn list_answers_by_submission_impl(&self, submission_id: i64) -> Result<Vec<Answer>> {
        let results = Answers::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::QuestionId)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询提交答案失败: {e}")))?;

        results.into_iter().map(|m| m.try_into_answer()).collect()
    }

    /// 某题目跨提交的全部答案（答案键重算作业用）
    pub async fn list_answers_by_question_impl(&self, question_id: i64) -> Result<Vec<Answer>> {
        let results = Answers::find()
            .filter(Column::QuestionId.eq(question_id))
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询题目答案失败: {e}")))?;

        results.into_iter().map(|m| m.try_into_answer()).collect()
    }

    /// 更新单个答案的得分
    pub async fn update_answer_score_impl(
        &self,
        submission_id: i64,
        update: AnswerScoreUpdate,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Answers::update_many()
            .col_expr(Column::Score, sea_orm::sea_query::Expr::value(update.score))
            .col_expr(
                Column::IsAutoGraded,
                sea_orm::sea_query::Expr::value(update.is_auto_graded),
            )
            .col_expr(
                Column::Feedback,
                sea_orm::sea_query::Expr::value(update.feedback),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::SubmissionId.eq(submission_id))
            .filter(Column::QuestionId.eq(update.question_id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新答案得分失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
