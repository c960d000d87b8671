//! 提交生命周期集成测试
//!
//! 跑在单连接内存 SQLite 上的真实存储层，覆盖状态机、门禁、评分、
//! 放出与申诉的端到端行为。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use assessment_core::events::DomainEvent;
use assessment_core::models::appeals::requests::SubmitAppealRequest;
use assessment_core::models::assignments::{
    entities::{Assignment, RandomizationType, ReviewMode},
    requests::CreateAssignmentRequest,
};
use assessment_core::models::overrides::{entities::OverrideKind, requests::GrantOverrideRequest};
use assessment_core::models::questions::requests::CreateQuestionRequest;
use assessment_core::models::questions::entities::QuestionKind;
use assessment_core::models::submissions::{
    entities::{Submission, SubmissionState},
    requests::{ManualGradeRequest, RecordAnswerRequest, StartSubmissionRequest},
};
use assessment_core::services::{
    AppealService, AssignmentService, OverrideService, PrerequisiteGate, SubmissionService,
};
use assessment_core::storage::{LocalObjectStore, Storage, sea_orm_storage::SeaOrmStorage};

const COURSE: i64 = 1;
const STUDENT: i64 = 501;
const INSTRUCTOR: i64 = 9;

struct TestEnv {
    storage: Arc<dyn Storage>,
    assignments: AssignmentService,
    submissions: SubmissionService,
    overrides: OverrideService,
    appeals: AppealService,
    gate: PrerequisiteGate,
    _upload_dir: tempfile::TempDir,
}

async fn setup() -> TestEnv {
    static TRACING: std::sync::Once = std::sync::Once::new();
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });

    let storage: Arc<dyn Storage> = Arc::new(
        SeaOrmStorage::new_with_url("sqlite::memory:")
            .await
            .expect("in-memory sqlite"),
    );
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let objects = Arc::new(LocalObjectStore::new(upload_dir.path(), 1024 * 1024));

    storage
        .create_enrollment(COURSE, STUDENT)
        .await
        .expect("enroll student");

    TestEnv {
        assignments: AssignmentService::new(storage.clone()),
        submissions: SubmissionService::new(storage.clone(), objects),
        overrides: OverrideService::new(storage.clone()),
        appeals: AppealService::new(storage.clone()),
        gate: PrerequisiteGate::new(storage.clone()),
        storage,
        _upload_dir: upload_dir,
    }
}

fn assignment_request() -> CreateAssignmentRequest {
    CreateAssignmentRequest {
        course_id: COURSE,
        unit_id: None,
        lesson_id: None,
        title: "quiz".into(),
        max_score: 100.0,
        deadline_at: None,
        tolerance_minutes: 0,
        max_attempts: None,
        cooldown_minutes: 0,
        retake_enabled: true,
        allow_late_submission: false,
        review_mode: ReviewMode::Deferred,
        time_limit_minutes: None,
        randomization_type: RandomizationType::None,
        random_subset_count: None,
        available_from: None,
        available_until: None,
    }
}

fn question_request(
    kind: QuestionKind,
    weight: f64,
    max_score: f64,
    answer_key: Option<serde_json::Value>,
) -> CreateQuestionRequest {
    CreateQuestionRequest {
        kind,
        prompt: "prompt".into(),
        options: None,
        weight,
        max_score,
        answer_key,
        position: 0,
    }
}

/// 建一份 单选10 + 判断5 + 简答20 的作业并发布，返回 (作业, [题目id])
async fn mixed_assignment(env: &TestEnv, req: CreateAssignmentRequest) -> (Assignment, Vec<i64>) {
    let assignment = env
        .assignments
        .create_assignment(INSTRUCTOR, req)
        .await
        .expect("create assignment");

    let mut ids = Vec::new();
    for req in [
        question_request(
            QuestionKind::MultipleChoice,
            10.0,
            10.0,
            Some(serde_json::json!("B")),
        ),
        question_request(
            QuestionKind::TrueFalse,
            5.0,
            5.0,
            Some(serde_json::json!("true")),
        ),
        question_request(QuestionKind::Essay, 20.0, 20.0, None),
    ] {
        let resp = env
            .assignments
            .add_question(INSTRUCTOR, assignment.id, req)
            .await
            .expect("add question");
        ids.push(resp.question.id);
    }

    let published = env.assignments.publish(INSTRUCTOR, assignment.id).await.expect("publish");
    (published, ids)
}

async fn answer_mixed(env: &TestEnv, submission: &Submission, question_ids: &[i64]) {
    for (question_id, content) in [
        (question_ids[0], "B"),
        (question_ids[1], "true"),
        (question_ids[2], "my essay text"),
    ] {
        env.submissions
            .record_answer(
                STUDENT,
                submission.id,
                question_id,
                RecordAnswerRequest {
                    content: Some(content.into()),
                    ..Default::default()
                },
            )
            .await
            .expect("record answer");
    }
}

async fn start(env: &TestEnv, assignment_id: i64) -> Submission {
    env.submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id,
                seed: None,
            },
        )
        .await
        .expect("start submission")
        .value
}

#[tokio::test]
async fn test_partial_auto_grade_then_manual_scenario() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;

    let submission = start(&env, assignment.id).await;
    assert_eq!(submission.state, SubmissionState::InProgress);
    assert_eq!(submission.attempt_number, 1);
    assert_eq!(submission.question_set, qids);

    answer_mixed(&env, &submission, &qids).await;

    let outcome = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .expect("submit");
    let submitted = outcome.value;
    assert_eq!(submitted.state, SubmissionState::PendingManualGrading);
    assert_eq!(submitted.score, Some(15.0));
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DomainEvent::GradingCompleted {
            requires_manual_grading: true,
            ..
        }
    )));

    // 简答题未批前成绩是草稿
    let grade = env
        .storage
        .get_submission_grade(submission.id)
        .await
        .unwrap()
        .expect("draft grade exists");
    assert!(grade.is_draft);
    assert_eq!(grade.score, 15.0);

    // 简答题批 18 分
    let graded = env
        .submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 18.0)]),
                question_feedback: HashMap::from([(qids[2], "well argued".into())]),
                feedback: Some("good work".into()),
                overall_score: None,
            },
        )
        .await
        .expect("manual grade")
        .value;
    assert_eq!(graded.state, SubmissionState::Graded);
    assert_eq!(graded.score, Some(33.0));

    let grade = env
        .storage
        .get_submission_grade(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!grade.is_draft);
    assert_eq!(grade.grader_id, Some(INSTRUCTOR));
    assert_eq!(grade.score, 33.0);
}

#[tokio::test]
async fn test_manual_grade_rejects_out_of_range_and_incomplete() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;
    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    // 越界得分
    let err = env
        .submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 25.0)]),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");

    // 不提供总分覆盖时必须所有答案都有分
    let err = env
        .submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::new(),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");
}

#[tokio::test]
async fn test_second_start_rejected_while_in_progress() {
    let env = setup().await;
    let (assignment, _) = mixed_assignment(&env, assignment_request()).await;

    let _first = start(&env, assignment.id).await;
    let err = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_retake_disabled_is_absolute_gate() {
    let env = setup().await;
    let mut req = assignment_request();
    req.max_attempts = Some(1);
    req.retake_enabled = false;
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    // 零冷却也不放行；尝试次数豁免同样救不回来
    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Attempts,
                reason: "requested".into(),
                value: serde_json::json!({ "additional_attempts": 3 }),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    let err = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_attempt_numbers_survive_resubmission_delete() {
    let env = setup().await;
    let mut req = assignment_request();
    req.max_attempts = Some(5);
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let first = start(&env, assignment.id).await;
    assert_eq!(first.attempt_number, 1);
    answer_mixed(&env, &first, &qids).await;
    env.submissions.submit(STUDENT, first.id).await.unwrap();

    // 重交：旧行被删，序号继续递增
    let second = start(&env, assignment.id).await;
    assert_eq!(second.attempt_number, 2);
    assert!(second.is_resubmission);

    let history = env
        .storage
        .list_submissions_by_student(assignment.id, STUDENT)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, second.id);

    answer_mixed(&env, &second, &qids).await;
    env.submissions.submit(STUDENT, second.id).await.unwrap();

    let third = start(&env, assignment.id).await;
    assert_eq!(third.attempt_number, 3);
}

#[tokio::test]
async fn test_attempt_limit_with_attempts_override() {
    let env = setup().await;
    let mut req = assignment_request();
    req.max_attempts = Some(1);
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let first = start(&env, assignment.id).await;
    answer_mixed(&env, &first, &qids).await;
    env.submissions.submit(STUDENT, first.id).await.unwrap();

    // 注意：重交会顶替旧行但仍消耗尝试序号，max_attempts=1 用尽
    let err = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");

    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Attempts,
                reason: "medical leave".into(),
                value: serde_json::json!({ "additional_attempts": 1 }),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    let second = start(&env, assignment.id).await;
    assert_eq!(second.attempt_number, 2);
}

#[tokio::test]
async fn test_cooldown_blocks_immediate_restart() {
    let env = setup().await;
    let mut req = assignment_request();
    req.cooldown_minutes = 30;
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let first = start(&env, assignment.id).await;
    answer_mixed(&env, &first, &qids).await;
    env.submissions.submit(STUDENT, first.id).await.unwrap();

    let err = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_deadline_override_extends_past_deadline_by_48h() {
    let env = setup().await;
    let mut req = assignment_request();
    req.deadline_at = Some(Utc::now() - Duration::hours(1));
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let submission = start(&env, assignment.id).await;

    // 无豁免：已过截止，不能作答
    let err = env
        .submissions
        .record_answer(
            STUDENT,
            submission.id,
            qids[0],
            RecordAnswerRequest {
                content: Some("B".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");

    let extended = Utc::now() + Duration::hours(48);
    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Deadline,
                reason: "hospitalized".into(),
                value: serde_json::json!({ "extended_deadline": extended }),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    // 豁免窗口内：截止检查通过且不算迟交
    assert!(
        env.overrides
            .check_deadline_with_override(&assignment, STUDENT, Utc::now())
            .await
            .unwrap()
    );
    assert!(
        !env.overrides
            .is_submission_late(&assignment, STUDENT, Utc::now())
            .await
            .unwrap()
    );

    answer_mixed(&env, &submission, &qids).await;
    let submitted = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .unwrap()
        .value;
    assert!(!submitted.is_late);
}

#[tokio::test]
async fn test_expired_override_is_inactive() {
    let env = setup().await;
    let (assignment, _) = mixed_assignment(&env, assignment_request()).await;

    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Attempts,
                reason: "short extension".into(),
                value: serde_json::json!({ "additional_attempts": 2 }),
                expires_at: Some(Utc::now() - Duration::minutes(1)),
            },
        )
        .await
        .unwrap();

    assert!(
        !env.overrides
            .has_active(assignment.id, STUDENT, OverrideKind::Attempts)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_override_value_validation() {
    let env = setup().await;
    let (assignment, _) = mixed_assignment(&env, assignment_request()).await;

    // 追加次数必须为正
    let err = env
        .overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Attempts,
                reason: "oops".into(),
                value: serde_json::json!({ "additional_attempts": 0 }),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");

    // 理由不能为空
    let err = env
        .overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Attempts,
                reason: "  ".into(),
                value: serde_json::json!({ "additional_attempts": 1 }),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");

    // 绕过列表里必须是真实前置
    let err = env
        .overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: assignment.id,
                student_id: STUDENT,
                kind: OverrideKind::Prerequisite,
                reason: "bypass".into(),
                value: serde_json::json!({ "bypassed_prerequisites": [99999] }),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");
}

#[tokio::test]
async fn test_mistyped_override_payload_rejected_not_widened() {
    let env = setup().await;
    let (target, _) = mixed_assignment(&env, assignment_request()).await;
    let (prereq, _) = mixed_assignment(&env, assignment_request()).await;
    env.gate
        .add_prerequisite(INSTRUCTOR, target.id, prereq.id)
        .await
        .unwrap();

    // 字段名写错不得被解析成"整体绕过前置"
    let err = env
        .overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: target.id,
                student_id: STUDENT,
                kind: OverrideKind::Prerequisite,
                reason: "typo payload".into(),
                value: serde_json::json!({ "bypassed_prereqs": [prereq.id] }),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");
    assert!(
        !env.overrides
            .has_active(target.id, STUDENT, OverrideKind::Prerequisite)
            .await
            .unwrap()
    );

    // 没有坏行占位，改正后的授予不会撞上单条生效限制
    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: target.id,
                student_id: STUDENT,
                kind: OverrideKind::Prerequisite,
                reason: "corrected payload".into(),
                value: serde_json::json!({ "bypassed_prerequisites": [prereq.id] }),
                expires_at: None,
            },
        )
        .await
        .expect("corrected grant succeeds");
}

#[tokio::test]
async fn test_prerequisite_gate_and_cycle_rejection() {
    let env = setup().await;
    let (a, a_qids) = mixed_assignment(&env, assignment_request()).await;
    let (b, _) = mixed_assignment(&env, assignment_request()).await;
    let (c, _) = mixed_assignment(&env, assignment_request()).await;

    env.gate.add_prerequisite(INSTRUCTOR, b.id, a.id).await.unwrap();
    env.gate.add_prerequisite(INSTRUCTOR, c.id, b.id).await.unwrap();

    // a -> c 会成环
    let err = env.gate.add_prerequisite(INSTRUCTOR, a.id, c.id).await.unwrap_err();
    assert_eq!(err.code(), "E005");

    // 自引用直接拒绝
    let err = env.gate.add_prerequisite(INSTRUCTOR, a.id, a.id).await.unwrap_err();
    assert_eq!(err.code(), "E005");

    // 前置未完成时 b 不能开始
    let check = env.gate.check(b.id, STUDENT).await.unwrap();
    assert!(!check.passed);
    assert_eq!(check.incomplete, vec![a.id]);
    let err = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: b.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");

    // 完成 a 后放行
    let submission = start(&env, a.id).await;
    answer_mixed(&env, &submission, &a_qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    assert!(env.gate.check(b.id, STUDENT).await.unwrap().passed);
    let b_submission = start(&env, b.id).await;
    assert_eq!(b_submission.assignment_id, b.id);
}

#[tokio::test]
async fn test_blanket_prerequisite_override_bypasses_gate() {
    let env = setup().await;
    let (a, _) = mixed_assignment(&env, assignment_request()).await;
    let (b, _) = mixed_assignment(&env, assignment_request()).await;
    env.gate.add_prerequisite(INSTRUCTOR, b.id, a.id).await.unwrap();

    assert!(!env.gate.check(b.id, STUDENT).await.unwrap().passed);

    env.overrides
        .grant(
            INSTRUCTOR,
            GrantOverrideRequest {
                assignment_id: b.id,
                student_id: STUDENT,
                kind: OverrideKind::Prerequisite,
                reason: "transfer credit".into(),
                value: serde_json::json!({ "bypassed_prerequisites": [] }),
                expires_at: None,
            },
        )
        .await
        .unwrap();

    assert!(env.gate.check(b.id, STUDENT).await.unwrap().passed);
}

#[tokio::test]
async fn test_release_rejects_draft_then_succeeds_once_graded() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;
    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    // 草稿成绩不能放出
    let err = env.submissions.release(INSTRUCTOR, submission.id).await.unwrap_err();
    assert_eq!(err.code(), "E007");

    env.submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 18.0)]),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap();

    let outcome = env.submissions.release(INSTRUCTOR, submission.id).await.unwrap();
    assert!(outcome.value.released_at.is_some());
    assert!(!outcome.value.is_draft);
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DomainEvent::GradesReleased { student_id, .. } if *student_id == STUDENT
    )));

    let released = env
        .storage
        .get_submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(released.state, SubmissionState::Released);

    // 重复放出被拒绝
    let err = env.submissions.release(INSTRUCTOR, submission.id).await.unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_bulk_release_partial_success() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;
    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();
    env.submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 10.0)]),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap();

    let outcome = env
        .submissions
        .release_bulk(INSTRUCTOR, &[submission.id, 424242])
        .await
        .unwrap();
    let result = outcome.value;
    assert_eq!(result.succeeded, vec![submission.id]);
    assert_eq!(result.failed, vec![424242]);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.all_succeeded());
}

#[tokio::test]
async fn test_immediate_review_releases_fully_objective_assignment() {
    let env = setup().await;
    let mut req = assignment_request();
    req.review_mode = ReviewMode::Immediate;
    let assignment = env
        .assignments
        .create_assignment(INSTRUCTOR, req)
        .await
        .unwrap();
    let q = env
        .assignments
        .add_question(
            INSTRUCTOR,
            assignment.id,
            question_request(
                QuestionKind::MultipleChoice,
                10.0,
                10.0,
                Some(serde_json::json!("A")),
            ),
        )
        .await
        .unwrap()
        .question;
    env.assignments.publish(INSTRUCTOR, assignment.id).await.unwrap();

    let submission = start(&env, assignment.id).await;
    env.submissions
        .record_answer(
            STUDENT,
            submission.id,
            q.id,
            RecordAnswerRequest {
                content: Some("A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = env.submissions.submit(STUDENT, submission.id).await.unwrap();
    assert_eq!(outcome.value.state, SubmissionState::Released);
    assert_eq!(outcome.value.score, Some(10.0));
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DomainEvent::GradesReleased { .. }
    )));
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DomainEvent::NewHighScoreAchieved { score, .. } if *score == 10.0
    )));

    let grade = env
        .storage
        .get_submission_grade(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert!(grade.released_at.is_some());
}

#[tokio::test]
async fn test_late_submission_appeal_double_deny() {
    let env = setup().await;
    let mut req = assignment_request();
    req.deadline_at = Some(Utc::now() + Duration::seconds(2));
    req.allow_late_submission = true;
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;

    // 截止过后交卷：作业允许迟交，落库并打上迟交标记
    tokio::time::sleep(std::time::Duration::from_millis(2600)).await;
    let submitted = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .unwrap()
        .value;
    assert!(submitted.is_late);

    let appeal = env
        .appeals
        .submit(
            STUDENT,
            SubmitAppealRequest {
                submission_id: submission.id,
                reason: "power outage".into(),
                documents: None,
            },
        )
        .await
        .unwrap()
        .value;

    // 同一提交不能二次申诉
    let err = env
        .appeals
        .submit(
            STUDENT,
            SubmitAppealRequest {
                submission_id: submission.id,
                reason: "again".into(),
                documents: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E008");

    env.appeals
        .deny(INSTRUCTOR, appeal.id, "no evidence".into())
        .await
        .unwrap();

    // 第二次驳回：已裁决
    let err = env
        .appeals
        .deny(INSTRUCTOR, appeal.id, "still no".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");
}

#[tokio::test]
async fn test_appeal_approval_clears_late_flag() {
    let env = setup().await;
    let mut req = assignment_request();
    req.deadline_at = Some(Utc::now() + Duration::seconds(2));
    req.allow_late_submission = true;
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    tokio::time::sleep(std::time::Duration::from_millis(2600)).await;
    let submitted = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .unwrap()
        .value;
    assert!(submitted.is_late);

    let appeal = env
        .appeals
        .submit(
            STUDENT,
            SubmitAppealRequest {
                submission_id: submission.id,
                reason: "documented emergency".into(),
                documents: Some(vec!["uploads/doc.pdf".into()]),
            },
        )
        .await
        .unwrap()
        .value;

    let outcome = env.appeals.approve(INSTRUCTOR, appeal.id).await.unwrap();
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DomainEvent::AppealDecided { approved: true, .. }
    )));

    let cleared = env
        .storage
        .get_submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!cleared.is_late);
}

#[tokio::test]
async fn test_appeal_requires_late_submission() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;
    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    let err = env
        .appeals
        .submit(
            STUDENT,
            SubmitAppealRequest {
                submission_id: submission.id,
                reason: "why late?".into(),
                documents: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_answer_key_recalculation_rescores_auto_answers() {
    use assessment_core::services::grading::recalculate;

    let env = setup().await;
    let mut req = assignment_request();
    req.review_mode = ReviewMode::Deferred;
    let assignment = env
        .assignments
        .create_assignment(INSTRUCTOR, req)
        .await
        .unwrap();
    let q = env
        .assignments
        .add_question(
            INSTRUCTOR,
            assignment.id,
            question_request(
                QuestionKind::MultipleChoice,
                10.0,
                10.0,
                Some(serde_json::json!("B")),
            ),
        )
        .await
        .unwrap()
        .question;
    env.assignments.publish(INSTRUCTOR, assignment.id).await.unwrap();

    let submission = start(&env, assignment.id).await;
    env.submissions
        .record_answer(
            STUDENT,
            submission.id,
            q.id,
            RecordAnswerRequest {
                content: Some("A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let submitted = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .unwrap()
        .value;
    assert_eq!(submitted.score, Some(0.0));

    // 答案键原来就是错的，改成 "A" 后同步重算一遍
    env.storage
        .update_answer_key(q.id, Some(serde_json::json!("A")))
        .await
        .unwrap();
    recalculate::recalculate_question(&env.storage, q.id)
        .await
        .unwrap();

    let rescored = env
        .storage
        .get_submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rescored.score, Some(10.0));

    let answers = env
        .storage
        .list_answers_by_submission(submission.id)
        .await
        .unwrap();
    assert_eq!(answers[0].score, Some(10.0));
    assert!(answers[0].is_auto_graded);
}

#[tokio::test]
async fn test_publish_blocks_on_weight_overflow() {
    let env = setup().await;
    let mut req = assignment_request();
    req.max_score = 10.0;
    let assignment = env
        .assignments
        .create_assignment(INSTRUCTOR, req)
        .await
        .unwrap();

    // 加题阶段只提示不阻断
    let resp = env
        .assignments
        .add_question(
            INSTRUCTOR,
            assignment.id,
            question_request(
                QuestionKind::MultipleChoice,
                15.0,
                15.0,
                Some(serde_json::json!("A")),
            ),
        )
        .await
        .unwrap();
    assert!(resp.advisory.exceeds_max_score);
    assert_eq!(resp.advisory.total_weight, 15.0);

    // 发布阶段硬校验
    let err = env.assignments.publish(INSTRUCTOR, assignment.id).await.unwrap_err();
    assert_eq!(err.code(), "E005");
}

#[tokio::test]
async fn test_unenrolled_student_cannot_start() {
    let env = setup().await;
    let (assignment, _) = mixed_assignment(&env, assignment_request()).await;

    let err = env
        .submissions
        .start(
            9999,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E009");
}

#[tokio::test]
async fn test_record_answer_outside_frozen_set_rejected() {
    let env = setup().await;
    let (a, _) = mixed_assignment(&env, assignment_request()).await;
    let (_b, b_qids) = mixed_assignment(&env, assignment_request()).await;

    let submission = start(&env, a.id).await;
    // 另一份作业的题目不在本提交的题单里
    let err = env
        .submissions
        .record_answer(
            STUDENT,
            submission.id,
            b_qids[0],
            RecordAnswerRequest {
                content: Some("B".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");
}

#[tokio::test]
async fn test_seeded_shuffle_is_deterministic() {
    let env = setup().await;
    let mut req = assignment_request();
    req.randomization_type = RandomizationType::Shuffle;
    req.max_attempts = Some(10);
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let first = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: Some(42),
            },
        )
        .await
        .unwrap()
        .value;
    assert_eq!(first.question_set.len(), qids.len());

    answer_mixed_by_set(&env, &first, &qids).await;
    env.submissions.submit(STUDENT, first.id).await.unwrap();

    let second = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: Some(42),
            },
        )
        .await
        .unwrap()
        .value;
    assert_eq!(first.question_set, second.question_set);
}

/// 与 answer_mixed 相同，但按题目 id 而非顺序匹配作答内容（乱序题单用）
async fn answer_mixed_by_set(env: &TestEnv, submission: &Submission, qids: &[i64]) {
    let content_by_question: HashMap<i64, &str> = HashMap::from([
        (qids[0], "B"),
        (qids[1], "true"),
        (qids[2], "essay text"),
    ]);
    for question_id in &submission.question_set {
        env.submissions
            .record_answer(
                STUDENT,
                submission.id,
                *question_id,
                RecordAnswerRequest {
                    content: Some(content_by_question[question_id].to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("record answer");
    }
}

#[tokio::test]
async fn test_random_subset_freezes_seeded_subset() {
    let env = setup().await;
    let mut req = assignment_request();
    req.randomization_type = RandomizationType::RandomSubset;
    req.random_subset_count = Some(2);
    req.max_attempts = Some(10);
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let first = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: Some(7),
            },
        )
        .await
        .unwrap()
        .value;
    assert_eq!(first.question_set.len(), 2);
    assert!(first.question_set.iter().all(|id| qids.contains(id)));

    // 抽到的子集就是本次的完整题单，作答交卷只覆盖它
    answer_mixed_by_set(&env, &first, &qids).await;
    env.submissions.submit(STUDENT, first.id).await.unwrap();

    let second = env
        .submissions
        .start(
            STUDENT,
            StartSubmissionRequest {
                assignment_id: assignment.id,
                seed: Some(7),
            },
        )
        .await
        .unwrap()
        .value;
    assert_eq!(first.question_set, second.question_set);
}

#[tokio::test]
async fn test_time_limited_assignment_accepts_answers_in_window() {
    let env = setup().await;
    let mut req = assignment_request();
    req.time_limit_minutes = Some(30);
    let (assignment, qids) = mixed_assignment(&env, req).await;

    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;

    let submitted = env
        .submissions
        .submit(STUDENT, submission.id)
        .await
        .expect("submit within time limit")
        .value;
    assert_eq!(submitted.state, SubmissionState::PendingManualGrading);
}

#[tokio::test]
async fn test_course_grade_refreshed_on_personal_best() {
    use assessment_core::services::grading::aggregator;

    let env = setup().await;
    let mut req = assignment_request();
    req.review_mode = ReviewMode::Immediate;
    req.max_score = 10.0;
    let assignment = env
        .assignments
        .create_assignment(INSTRUCTOR, req)
        .await
        .unwrap();
    let q = env
        .assignments
        .add_question(
            INSTRUCTOR,
            assignment.id,
            question_request(
                QuestionKind::MultipleChoice,
                10.0,
                10.0,
                Some(serde_json::json!("A")),
            ),
        )
        .await
        .unwrap()
        .question;
    env.assignments.publish(INSTRUCTOR, assignment.id).await.unwrap();

    let submission = start(&env, assignment.id).await;
    env.submissions
        .record_answer(
            STUDENT,
            submission.id,
            q.id,
            RecordAnswerRequest {
                content: Some("A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    // 满分个人最好成绩，课程成绩聚合为 100
    let course = aggregator::calculate_course_grade(&env.storage, STUDENT, COURSE)
        .await
        .unwrap();
    assert_eq!(course, 100.0);

    // 即时可见模式下提交成绩已放出
    let grade = env
        .storage
        .get_submission_grade(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert!(grade.is_released());
}

#[tokio::test]
async fn test_reopen_for_regrade_round_trip() {
    let env = setup().await;
    let (assignment, qids) = mixed_assignment(&env, assignment_request()).await;
    let submission = start(&env, assignment.id).await;
    answer_mixed(&env, &submission, &qids).await;
    env.submissions.submit(STUDENT, submission.id).await.unwrap();

    // 待人工批改状态不能退回
    let err = env
        .submissions
        .reopen_for_regrade(INSTRUCTOR, submission.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");

    env.submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 12.0)]),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap();

    let reopened = env
        .submissions
        .reopen_for_regrade(INSTRUCTOR, submission.id)
        .await
        .unwrap();
    assert_eq!(reopened.state, SubmissionState::PendingManualGrading);

    // 重新批改后回到 graded，分数被覆盖
    let regraded = env
        .submissions
        .grade_manual(
            INSTRUCTOR,
            submission.id,
            ManualGradeRequest {
                question_scores: HashMap::from([(qids[2], 20.0)]),
                question_feedback: HashMap::new(),
                feedback: None,
                overall_score: None,
            },
        )
        .await
        .unwrap()
        .value;
    assert_eq!(regraded.state, SubmissionState::Graded);
    assert_eq!(regraded.score, Some(35.0));
}

#[tokio::test]
async fn test_duplicate_active_override_rejected() {
    let env = setup().await;
    let (assignment, _) = mixed_assignment(&env, assignment_request()).await;

    let grant = |attempts: i32| GrantOverrideRequest {
        assignment_id: assignment.id,
        student_id: STUDENT,
        kind: OverrideKind::Attempts,
        reason: "extension".into(),
        value: serde_json::json!({ "additional_attempts": attempts }),
        expires_at: None,
    };

    env.overrides.grant(INSTRUCTOR, grant(1)).await.unwrap();
    let err = env.overrides.grant(INSTRUCTOR, grant(2)).await.unwrap_err();
    assert_eq!(err.code(), "E008");
}
