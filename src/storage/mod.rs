use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    answers::{entities::Answer, requests::AnswerScoreUpdate},
    appeals::entities::{Appeal, AppealStatus},
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::CreateAssignmentRequest,
    },
    enrollments::entities::Enrollment,
    grades::{entities::Grade, requests::GradeWrite},
    overrides::entities::{Override, OverrideKind, OverrideValue},
    questions::{entities::Question, requests::CreateQuestionRequest},
    submissions::entities::{Submission, SubmissionState},
};

use crate::errors::Result;

pub mod object_store;
pub mod sea_orm_storage;

pub use object_store::{LocalObjectStore, ObjectStore};

/// 新建提交尝试的落库参数
///
/// `replace_submission_id` 指向重交时要删除的旧提交行，删除与插入同一事务。
#[derive(Debug, Clone)]
pub struct NewSubmissionAttempt {
    pub assignment_id: i64,
    pub student_id: i64,
    pub attempt_number: i32,
    pub is_resubmission: bool,
    pub question_set: Vec<i64>,
    pub replace_submission_id: Option<i64>,
}

/// 记录答案的落库参数（按 (submission, question) 幂等覆盖）
#[derive(Debug, Clone, Default)]
pub struct AnswerWrite {
    pub content: Option<String>,
    pub selected_options: Option<Vec<String>>,
    pub file_paths: Option<Vec<String>>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 作业管理方法
    // 创建作业
    async fn create_assignment(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment>;
    // 通过ID获取作业
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;
    // 列出课程下所有作业（直挂、经 unit、经 lesson）
    async fn list_assignments_by_course(&self, course_id: i64) -> Result<Vec<Assignment>>;
    // 更新作业发布状态
    async fn update_assignment_status(&self, id: i64, status: AssignmentStatus) -> Result<bool>;

    /// 题目管理方法
    // 添加题目
    async fn create_question(
        &self,
        assignment_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question>;
    // 通过ID获取题目
    async fn get_question_by_id(&self, id: i64) -> Result<Option<Question>>;
    // 按题序列出作业题目
    async fn list_questions_by_assignment(&self, assignment_id: i64) -> Result<Vec<Question>>;
    // 更新答案键（None 表示清除）
    async fn update_answer_key(
        &self,
        question_id: i64,
        answer_key: Option<serde_json::Value>,
    ) -> Result<bool>;

    /// 前置作业方法
    // 插入一条前置边（调用方负责环检测）
    async fn add_prerequisite_edge(&self, assignment_id: i64, prerequisite_id: i64) -> Result<()>;
    // 某作业的直接前置作业 ID
    async fn list_prerequisites(&self, assignment_id: i64) -> Result<Vec<i64>>;
    // 全量前置边，环检测用
    async fn list_all_prerequisite_edges(&self) -> Result<Vec<(i64, i64)>>;

    /// 提交生命周期方法
    // 创建新尝试；同一 (assignment, student) 已有进行中提交时返回 Conflict
    async fn create_submission_attempt(&self, attempt: NewSubmissionAttempt)
    -> Result<Submission>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    // 查找进行中的提交
    async fn find_active_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>>;
    // 学生在某作业下的全部提交（按尝试序号倒序）
    async fn list_submissions_by_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>>;
    // 交卷：置 submitted 状态并释放 active 标记
    async fn finalize_submission(
        &self,
        id: i64,
        submitted_at: DateTime<Utc>,
        is_late: bool,
    ) -> Result<Option<Submission>>;
    // 状态流转（人工批改退回等）
    async fn set_submission_state(&self, id: i64, state: SubmissionState) -> Result<bool>;
    // 仅更新提交总分（答案键重算作业用）
    async fn update_submission_score(&self, id: i64, score: f64) -> Result<bool>;
    // 申诉批准后清除迟交标记
    async fn clear_submission_late_flag(&self, id: i64) -> Result<bool>;

    /// 答案方法
    // 记录/覆盖答案
    async fn upsert_answer(
        &self,
        submission_id: i64,
        question_id: i64,
        write: AnswerWrite,
    ) -> Result<Answer>;
    // 列出提交的全部答案
    async fn list_answers_by_submission(&self, submission_id: i64) -> Result<Vec<Answer>>;
    // 某题目的全部答案（答案键重算作业用）
    async fn list_answers_by_question(&self, question_id: i64) -> Result<Vec<Answer>>;
    // 更新单个答案的得分
    async fn update_answer_score(
        &self,
        submission_id: i64,
        update: AnswerScoreUpdate,
    ) -> Result<bool>;

    /// 评分方法
    // 一次事务内写入答案得分、提交状态与成绩行
    async fn apply_grading_result(
        &self,
        submission_id: i64,
        answer_scores: Vec<AnswerScoreUpdate>,
        state: SubmissionState,
        score: f64,
        grade: GradeWrite,
    ) -> Result<Submission>;
    // 写入/覆盖成绩行
    async fn upsert_grade(&self, write: GradeWrite) -> Result<Grade>;
    // 某提交的成绩
    async fn get_submission_grade(&self, submission_id: i64) -> Result<Option<Grade>>;
    // 放出成绩：置 released_at 并把提交转为 released，同一事务
    async fn release_submission(
        &self,
        submission_id: i64,
        released_at: DateTime<Utc>,
    ) -> Result<Grade>;

    /// 豁免方法
    // 授予豁免
    async fn create_override(
        &self,
        granted_by: i64,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        value: OverrideValue,
        reason: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Override>;
    // 查找某类型的生效豁免（expires_at 为空或晚于 now）
    async fn find_active_override(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        now: DateTime<Utc>,
    ) -> Result<Option<Override>>;

    /// 申诉方法
    // 创建申诉；同一提交已有申诉时返回 Conflict
    async fn create_appeal(
        &self,
        student_id: i64,
        submission_id: i64,
        reason: String,
        documents: Option<Vec<String>>,
    ) -> Result<Appeal>;
    // 通过ID获取申诉
    async fn get_appeal_by_id(&self, id: i64) -> Result<Option<Appeal>>;
    // 通过提交ID获取申诉
    async fn get_appeal_by_submission(&self, submission_id: i64) -> Result<Option<Appeal>>;
    // 裁决申诉；批准时同一事务清除提交的迟交标记
    async fn decide_appeal(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        decided_by: i64,
        decision_note: Option<String>,
        clear_late_flag: bool,
    ) -> Result<Appeal>;

    /// 选课方法
    // 登记选课（外部报名系统的接口面）
    async fn create_enrollment(&self, course_id: i64, student_id: i64) -> Result<Enrollment>;
    // 查找生效选课记录，提交创建前的资格校验
    async fn find_active_enrollment(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
