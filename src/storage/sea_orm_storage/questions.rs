//! 题目存储操作

use super::SeaOrmStorage;
use crate::entity::questions::{ActiveModel, Column, Entity as Questions};
use crate::errors::{AssessmentError, Result};
use crate::models::questions::{entities::Question, requests::CreateQuestionRequest};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 添加题目
    pub async fn create_question_impl(
        &self,
        assignment_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            kind: Set(req.kind.to_string()),
            prompt: Set(req.prompt),
            options: Set(req
                .options
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?),
            weight: Set(req.weight),
            max_score: Set(req.max_score),
            answer_key: Set(req
                .answer_key
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?),
            position: Set(req.position),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建题目失败: {e}")))?;

        result.try_into_question()
    }

    /// 通过 ID 获取题目
    pub async fn get_question_by_id_impl(&self, id: i64) -> Result<Option<Question>> {
        let result = Questions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询题目失败: {e}")))?;

        result.map(|m| m.try_into_question()).transpose()
    }

    /// 按题序列出作业的全部题目
    pub async fn list_questions_by_assignment_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<Question>> {
        let results = Questions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询作业题目失败: {e}")))?;

        results.into_iter().map(|m| m.try_into_question()).collect()
    }

    /// 更新题目的答案键（None 表示清除）
    pub async fn update_answer_key_impl(
        &self,
        question_id: i64,
        answer_key: Option<serde_json::Value>,
    ) -> Result<bool> {
        let serialized = answer_key.as_ref().map(serde_json::to_string).transpose()?;

        let result = Questions::update_many()
            .col_expr(Column::AnswerKey, sea_orm::sea_query::Expr::value(serialized))
            .filter(Column::Id.eq(question_id))
            .exec(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("更新答案键失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
