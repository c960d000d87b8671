//! 作业编排
//!
//! 生命周期所需的最小教师侧入口：建作业、加题、改答案键、发布。
//! 权重总和对满分的约束分两档：加题时只给提示，发布时硬校验。

use std::sync::Arc;

use tracing::info;

use crate::errors::{AssessmentError, Result};
use crate::models::assignments::{
    entities::{Assignment, AssignmentStatus, RandomizationType},
    requests::CreateAssignmentRequest,
};
use crate::models::questions::{
    entities::Question,
    requests::CreateQuestionRequest,
    responses::{CreateQuestionResponse, WeightAdvisory},
};
use crate::services::grading::recalculate;
use crate::storage::Storage;
use crate::utils::validate;

pub struct AssignmentService {
    storage: Arc<dyn Storage>,
}

impl AssignmentService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 创建作业（草稿状态）
    pub async fn create_assignment(
        &self,
        actor_id: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        validate::non_empty(&req.title, "作业标题")?;
        if req.max_score <= 0.0 || !req.max_score.is_finite() {
            return Err(AssessmentError::validation("作业满分必须为正数"));
        }
        if req.randomization_type == RandomizationType::RandomSubset
            && req.random_subset_count.is_none_or(|c| c < 1)
        {
            return Err(AssessmentError::validation(
                "random_subset 组卷必须指定正的抽题数量",
            ));
        }
        if let (Some(from), Some(until)) = (req.available_from, req.available_until)
            && from >= until
        {
            return Err(AssessmentError::validation("开放窗口起点必须早于终点"));
        }

        self.storage.create_assignment(actor_id, req).await
    }

    pub async fn get_assignment(&self, id: i64) -> Result<Assignment> {
        self.storage
            .get_assignment_by_id(id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("作业不存在: {id}")))
    }

    /// 添加题目
    ///
    /// 权重总和超过作业满分只在响应里提示，不阻断写入。
    pub async fn add_question(
        &self,
        actor_id: i64,
        assignment_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<CreateQuestionResponse> {
        let assignment = self.get_assignment(assignment_id).await?;

        validate::non_empty(&req.prompt, "题干")?;
        if req.weight <= 0.0 || !req.weight.is_finite() {
            return Err(AssessmentError::validation("题目权重必须为正数"));
        }
        if req.max_score <= 0.0 || !req.max_score.is_finite() {
            return Err(AssessmentError::validation("题目满分必须为正数"));
        }
        if req.answer_key.is_some() && !req.kind.is_auto_gradable() {
            return Err(AssessmentError::validation(format!(
                "{} 题型不支持答案键",
                req.kind
            )));
        }

        let question = self.storage.create_question(assignment_id, req).await?;
        info!(actor_id, assignment_id, question_id = question.id, "question added");
        let advisory = self.weight_advisory(&assignment).await?;
        Ok(CreateQuestionResponse { question, advisory })
    }

    /// 更新答案键并派发历史提交的后台重算
    pub async fn update_answer_key(
        &self,
        actor_id: i64,
        question_id: i64,
        answer_key: Option<serde_json::Value>,
    ) -> Result<Question> {
        let question = self
            .storage
            .get_question_by_id(question_id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("题目不存在: {question_id}")))?;
        if answer_key.is_some() && !question.kind.is_auto_gradable() {
            return Err(AssessmentError::validation(format!(
                "{} 题型不支持答案键",
                question.kind
            )));
        }

        self.storage.update_answer_key(question_id, answer_key).await?;
        info!(actor_id, question_id, "answer key updated, dispatching recalculation");
        recalculate::spawn_answer_key_recalculation(self.storage.clone(), question_id);

        self.storage
            .get_question_by_id(question_id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("题目不存在: {question_id}")))
    }

    /// 发布作业
    ///
    /// 此处硬校验权重总和不超过满分，并要求至少有一道题。
    pub async fn publish(&self, actor_id: i64, assignment_id: i64) -> Result<Assignment> {
        let assignment = self.get_assignment(assignment_id).await?;
        if assignment.status == AssignmentStatus::Published {
            return Err(AssessmentError::not_allowed("作业已发布"));
        }

        let advisory = self.weight_advisory(&assignment).await?;
        if advisory.total_weight <= 0.0 {
            return Err(AssessmentError::validation("作业没有题目，无法发布"));
        }
        if advisory.exceeds_max_score {
            return Err(AssessmentError::validation(format!(
                "题目权重总和 {} 超过作业满分 {}",
                advisory.total_weight, advisory.assignment_max_score
            )));
        }

        self.storage
            .update_assignment_status(assignment_id, AssignmentStatus::Published)
            .await?;
        info!(actor_id, assignment_id, "assignment published");
        self.get_assignment(assignment_id).await
    }

    async fn weight_advisory(&self, assignment: &Assignment) -> Result<WeightAdvisory> {
        let questions = self
            .storage
            .list_questions_by_assignment(assignment.id)
            .await?;
        let total_weight: f64 = questions.iter().map(|q| q.weight).sum();
        Ok(WeightAdvisory {
            total_weight,
            assignment_max_score: assignment.max_score,
            exceeds_max_score: total_weight > assignment.max_score,
        })
    }
}
