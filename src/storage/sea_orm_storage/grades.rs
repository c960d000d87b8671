//! 成绩存储操作

use super::SeaOrmStorage;
use crate::entity::grades::{ActiveModel, Column, Entity as Grades, Model as GradeModel};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::answers::requests::AnswerScoreUpdate;
use crate::models::grades::{
    entities::{Grade, GradeSourceType},
    requests::GradeWrite,
};
use crate::models::submissions::entities::{Submission, SubmissionState};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

impl SeaOrmStorage {
    /// 一次事务内落盘评分结果：答案得分、提交状态与总分、成绩行
    pub async fn apply_grading_result_impl(
        &self,
        submission_id: i64,
        answer_scores: Vec<AnswerScoreUpdate>,
        state: SubmissionState,
        score: f64,
        grade: GradeWrite,
    ) -> Result<Submission> {
        use crate::entity::answers::{Column as AnswerColumn, Entity as Answers};

        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        for update in answer_scores {
            Answers::update_many()
                .col_expr(
                    AnswerColumn::Score,
                    sea_orm::sea_query::Expr::value(update.score),
                )
                .col_expr(
                    AnswerColumn::IsAutoGraded,
                    sea_orm::sea_query::Expr::value(update.is_auto_graded),
                )
                .col_expr(
                    AnswerColumn::Feedback,
                    sea_orm::sea_query::Expr::value(update.feedback),
                )
                .col_expr(AnswerColumn::UpdatedAt, sea_orm::sea_query::Expr::value(now))
                .filter(AnswerColumn::SubmissionId.eq(submission_id))
                .filter(AnswerColumn::QuestionId.eq(update.question_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    AssessmentError::database_operation(format!("写入答案得分失败: {e}"))
                })?;
        }

        let updated = Submissions::update_many()
            .col_expr(
                SubmissionColumn::State,
                sea_orm::sea_query::Expr::value(state.to_string()),
            )
            .col_expr(
                SubmissionColumn::Score,
                sea_orm::sea_query::Expr::value(Some(score)),
            )
            .filter(SubmissionColumn::Id.eq(submission_id))
            .exec(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新提交状态失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(AssessmentError::not_found(format!(
                "提交不存在: {submission_id}"
            )));
        }

        upsert_grade_on(&txn, grade).await?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_submission_by_id_impl(submission_id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))
    }

    /// 写入/覆盖成绩行
    pub async fn upsert_grade_impl(&self, write: GradeWrite) -> Result<Grade> {
        let model = upsert_grade_on(&self.db, write).await?;
        model.try_into_grade()
    }

    /// 某提交的成绩行
    pub async fn get_submission_grade_impl(&self, submission_id: i64) -> Result<Option<Grade>> {
        let result = Grades::find()
            .filter(Column::SourceType.eq(GradeSourceType::Submission.to_string()))
            .filter(Column::SourceId.eq(submission_id))
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询成绩失败: {e}")))?;

        result.map(|m| m.try_into_grade()).transpose()
    }

    /// 放出成绩：成绩转正并盖上 released_at，提交状态同一事务转为 released
    pub async fn release_submission_impl(
        &self,
        submission_id: i64,
        released_at: DateTime<Utc>,
    ) -> Result<Grade> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        let updated = Grades::update_many()
            .col_expr(Column::IsDraft, sea_orm::sea_query::Expr::value(false))
            .col_expr(
                Column::ReleasedAt,
                sea_orm::sea_query::Expr::value(Some(released_at.timestamp())),
            )
            .filter(Column::SourceType.eq(GradeSourceType::Submission.to_string()))
            .filter(Column::SourceId.eq(submission_id))
            .exec(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("放出成绩失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(AssessmentError::not_found(format!(
                "提交 {submission_id} 尚无成绩行"
            )));
        }

        Submissions::update_many()
            .col_expr(
                SubmissionColumn::State,
                sea_orm::sea_query::Expr::value(SubmissionState::Released.to_string()),
            )
            .filter(SubmissionColumn::Id.eq(submission_id))
            .exec(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新提交状态失败: {e}")))?;

        let grade = Grades::find()
            .filter(Column::SourceType.eq(GradeSourceType::Submission.to_string()))
            .filter(Column::SourceId.eq(submission_id))
            .one(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("回查成绩失败: {e}")))?
            .ok_or_else(|| AssessmentError::database_operation("成绩更新后不存在"))?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        grade.try_into_grade()
    }
}

/// 按 (source_type, source_id, user_id) 幂等写入成绩行
async fn upsert_grade_on<C: ConnectionTrait>(conn: &C, write: GradeWrite) -> Result<GradeModel> {
    let now = chrono::Utc::now().timestamp();

    let model = ActiveModel {
        source_type: Set(write.source_type.to_string()),
        source_id: Set(write.source_id),
        user_id: Set(write.user_id),
        grader_id: Set(write.grader_id),
        score: Set(write.score),
        max_score: Set(write.max_score),
        is_draft: Set(write.is_draft),
        feedback: Set(write.feedback),
        graded_at: Set(now),
        released_at: Set(write.released_at.map(|d| d.timestamp())),
        ..Default::default()
    };

    Grades::insert(model)
        .on_conflict(
            OnConflict::columns([Column::SourceType, Column::SourceId, Column::UserId])
                .update_columns([
                    Column::GraderId,
                    Column::Score,
                    Column::MaxScore,
                    Column::IsDraft,
                    Column::Feedback,
                    Column::GradedAt,
                    Column::ReleasedAt,
                ])
                .to_owned(),
        )
        .exec(conn)
        .await
        .map_err(|e| AssessmentError::database_operation(format!("写入成绩失败: {e}")))?;

    Grades::find()
        .filter(Column::SourceType.eq(write.source_type.to_string()))
        .filter(Column::SourceId.eq(write.source_id))
        .filter(Column::UserId.eq(write.user_id))
        .one(conn)
        .await
        .map_err(|e| AssessmentError::database_operation(format!("回查成绩失败: {e}")))?
        .ok_or_else(|| AssessmentError::database_operation("成绩写入后不存在"))
}
