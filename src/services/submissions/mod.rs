//! 提交生命周期
//!
//! 状态机：in_progress → submitted → {auto_graded | pending_manual_grading}
//! → graded → released。graded 可退回 pending_manual_grading 重新批改，
//! 绝不回到 in_progress。全客观题且即时可见模式的作业在自动评分后直接
//! 放出。每个流转的校验都发生在落库之前，落库本身单事务。

pub mod answer;
pub mod grade;
pub mod release;
pub mod start;
pub mod submit;

use std::sync::Arc;

use crate::errors::Result;
use crate::events::Outcome;
use crate::models::answers::entities::Answer;
use crate::models::common::bulk::BulkOperationResult;
use crate::models::grades::entities::Grade;
use crate::models::submissions::{
    entities::Submission,
    requests::{ManualGradeRequest, RecordAnswerRequest, StartSubmissionRequest},
};
use crate::services::overrides::OverrideService;
use crate::services::prerequisites::PrerequisiteGate;
use crate::storage::{ObjectStore, Storage};

pub struct SubmissionService {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) overrides: OverrideService,
    pub(crate) gate: PrerequisiteGate,
}

impl SubmissionService {
    pub fn new(storage: Arc<dyn Storage>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            overrides: OverrideService::new(storage.clone()),
            gate: PrerequisiteGate::new(storage.clone()),
            storage,
            objects,
        }
    }

    /// 开始一次新的作答尝试
    pub async fn start(
        &self,
        student_id: i64,
        req: StartSubmissionRequest,
    ) -> Result<Outcome<Submission>> {
        start::start(self, student_id, req).await
    }

    /// 记录一道题的作答
    pub async fn record_answer(
        &self,
        student_id: i64,
        submission_id: i64,
        question_id: i64,
        req: RecordAnswerRequest,
    ) -> Result<Outcome<Answer>> {
        answer::record_answer(self, student_id, submission_id, question_id, req).await
    }

    /// 交卷并同步触发自动评分
    pub async fn submit(&self, student_id: i64, submission_id: i64) -> Result<Outcome<Submission>> {
        submit::submit(self, student_id, submission_id).await
    }

    /// 人工批改（含 graded 状态下的重新批改）
    pub async fn grade_manual(
        &self,
        grader_id: i64,
        submission_id: i64,
        req: ManualGradeRequest,
    ) -> Result<Outcome<Submission>> {
        grade::grade_manual(self, grader_id, submission_id, req).await
    }

    /// 把已批改的提交退回待人工批改（重新批改入口）
    pub async fn reopen_for_regrade(&self, actor_id: i64, submission_id: i64) -> Result<Submission> {
        grade::reopen_for_regrade(self, actor_id, submission_id).await
    }

    /// 放出单个提交的成绩
    pub async fn release(&self, actor_id: i64, submission_id: i64) -> Result<Outcome<Grade>> {
        release::release(self, actor_id, submission_id).await
    }

    /// 批量放出，部分成功语义
    pub async fn release_bulk(
        &self,
        actor_id: i64,
        submission_ids: &[i64],
    ) -> Result<Outcome<BulkOperationResult>> {
        release::release_bulk(self, actor_id, submission_ids).await
    }
}
