//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 生命周期相关的不变量（单个进行中提交、单个答案、单条申诉）由
//! 唯一索引保证，并发竞争的落败方拿到 Conflict 错误。

mod answers;
mod appeals;
mod assignments;
mod enrollments;
mod grades;
mod overrides;
mod prerequisites;
mod questions;
mod submissions;

use crate::config::AppConfig;
use crate::errors::{AssessmentError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例（使用全局配置）
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::new_with_url(&config.database.url).await
    }

    /// 从指定 URL 创建存储实例（测试用内存库也走这里）
    pub async fn new_with_url(url: &str) -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| AssessmentError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("temp_store", "memory");
        }

        // 内存库必须保持单连接：连接池的每个连接会各自打开一份独立的库
        let max_connections = if in_memory {
            1
        } else {
            config.database.pool_size
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(None)
            .connect_with(opt)
            .await
            .map_err(|e| AssessmentError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| AssessmentError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(AssessmentError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 把唯一性约束冲突映射为 Conflict，其余映射为 DatabaseOperation
    pub(crate) fn map_write_err(context: &str, e: sea_orm::DbErr) -> AssessmentError {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            AssessmentError::conflict(format!("{context}: 唯一性约束冲突"))
        } else {
            AssessmentError::database_operation(format!("{context}: {e}"))
        }
    }
}

// Storage trait 实现
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
use crate::storage::{AnswerWrite, NewSubmissionAttempt, Storage};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 作业模块
    async fn create_assignment(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        self.create_assignment_impl(created_by, req).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn list_assignments_by_course(&self, course_id: i64) -> Result<Vec<Assignment>> {
        self.list_assignments_by_course_impl(course_id).await
    }

    async fn update_assignment_status(&self, id: i64, status: AssignmentStatus) -> Result<bool> {
        self.update_assignment_status_impl(id, status).await
    }

    // 题目模块
    async fn create_question(
        &self,
        assignment_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question> {
        self.create_question_impl(assignment_id, req).await
    }

    async fn get_question_by_id(&self, id: i64) -> Result<Option<Question>> {
        self.get_question_by_id_impl(id).await
    }

    async fn list_questions_by_assignment(&self, assignment_id: i64) -> Result<Vec<Question>> {
        self.list_questions_by_assignment_impl(assignment_id).await
    }

    async fn update_answer_key(
        &self,
        question_id: i64,
        answer_key: Option<serde_json::Value>,
    ) -> Result<bool> {
        self.update_answer_key_impl(question_id, answer_key).await
    }

    // 前置作业模块
    async fn add_prerequisite_edge(&self, assignment_id: i64, prerequisite_id: i64) -> Result<()> {
        self.add_prerequisite_edge_impl(assignment_id, prerequisite_id)
            .await
    }

    async fn list_prerequisites(&self, assignment_id: i64) -> Result<Vec<i64>> {
        self.list_prerequisites_impl(assignment_id).await
    }

    async fn list_all_prerequisite_edges(&self) -> Result<Vec<(i64, i64)>> {
        self.list_all_prerequisite_edges_impl().await
    }

    // 提交模块
    async fn create_submission_attempt(
        &self,
        attempt: NewSubmissionAttempt,
    ) -> Result<Submission> {
        self.create_submission_attempt_impl(attempt).await
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn find_active_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        self.find_active_submission_impl(assignment_id, student_id)
            .await
    }

    async fn list_submissions_by_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>> {
        self.list_submissions_by_student_impl(assignment_id, student_id)
            .await
    }

    async fn finalize_submission(
        &self,
        id: i64,
        submitted_at: DateTime<Utc>,
        is_late: bool,
    ) -> Result<Option<Submission>> {
        self.finalize_submission_impl(id, submitted_at, is_late)
            .await
    }

    async fn set_submission_state(&self, id: i64, state: SubmissionState) -> Result<bool> {
        self.set_submission_state_impl(id, state).await
    }

    async fn update_submission_score(&self, id: i64, score: f64) -> Result<bool> {
        self.update_submission_score_impl(id, score).await
    }

    async fn clear_submission_late_flag(&self, id: i64) -> Result<bool> {
        self.clear_submission_late_flag_impl(id).await
    }

    // 答案模块
    async fn upsert_answer(
        &self,
        submission_id: i64,
        question_id: i64,
        write: AnswerWrite,
    ) -> Result<Answer> {
        self.upsert_answer_impl(submission_id, question_id, write)
            .await
    }

    async fn list_answers_by_submission(&self, submission_id: i64) -> Result<Vec<Answer>> {
        self.list_answers_by_submission_impl(submission_id).await
    }

    async fn list_answers_by_question(&self, question_id: i64) -> Result<Vec<Answer>> {
        self.list_answers_by_question_impl(question_id).await
    }

    async fn update_answer_score(
        &self,
        submission_id: i64,
        update: AnswerScoreUpdate,
    ) -> Result<bool> {
        self.update_answer_score_impl(submission_id, update).await
    }

    // 评分模块
    async fn apply_grading_result(
        &self,
        submission_id: i64,
        answer_scores: Vec<AnswerScoreUpdate>,
        state: SubmissionState,
        score: f64,
        grade: GradeWrite,
    ) -> Result<Submission> {
        self.apply_grading_result_impl(submission_id, answer_scores, state, score, grade)
            .await
    }

    async fn upsert_grade(&self, write: GradeWrite) -> Result<Grade> {
        self.upsert_grade_impl(write).await
    }

    async fn get_submission_grade(&self, submission_id: i64) -> Result<Option<Grade>> {
        self.get_submission_grade_impl(submission_id).await
    }

    async fn release_submission(
        &self,
        submission_id: i64,
        released_at: DateTime<Utc>,
    ) -> Result<Grade> {
        self.release_submission_impl(submission_id, released_at)
            .await
    }

    // 豁免模块
    async fn create_override(
        &self,
        granted_by: i64,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        value: OverrideValue,
        reason: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Override> {
        self.create_override_impl(
            granted_by,
            assignment_id,
            student_id,
            kind,
            value,
            reason,
            expires_at,
        )
        .await
    }

    async fn find_active_override(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        now: DateTime<Utc>,
    ) -> Result<Option<Override>> {
        self.find_active_override_impl(assignment_id, student_id, kind, now)
            .await
    }

    // 申诉模块
    async fn create_appeal(
        &self,
        student_id: i64,
        submission_id: i64,
        reason: String,
        documents: Option<Vec<String>>,
    ) -> Result<Appeal> {
        self.create_appeal_impl(student_id, submission_id, reason, documents)
            .await
    }

    async fn get_appeal_by_id(&self, id: i64) -> Result<Option<Appeal>> {
        self.get_appeal_by_id_impl(id).await
    }

    async fn get_appeal_by_submission(&self, submission_id: i64) -> Result<Option<Appeal>> {
        self.get_appeal_by_submission_impl(submission_id).await
    }

    async fn decide_appeal(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        decided_by: i64,
        decision_note: Option<String>,
        clear_late_flag: bool,
    ) -> Result<Appeal> {
        self.decide_appeal_impl(appeal_id, status, decided_by, decision_note, clear_late_flag)
            .await
    }

    // 选课模块
    async fn create_enrollment(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        self.create_enrollment_impl(course_id, student_id).await
    }

    async fn find_active_enrollment(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        self.find_active_enrollment_impl(student_id, course_id)
            .await
    }
}
