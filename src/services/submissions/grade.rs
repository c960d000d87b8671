//! 评分：交卷后的自动评分与教师的人工批改

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use super::SubmissionService;
use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::answers::requests::AnswerScoreUpdate;
use crate::models::assignments::entities::{Assignment, ReviewMode};
use crate::models::grades::{entities::GradeSourceType, requests::GradeWrite};
use crate::models::questions::entities::Question;
use crate::models::submissions::{
    entities::{Submission, SubmissionState},
    requests::ManualGradeRequest,
};
use crate::services::grading::{aggregator, strategies};
use crate::utils::validate;

/// 交卷后的自动评分
///
/// 题单里出现任何无法自动评分的题（主观题或缺答案键）则进入
/// pending_manual_grading，否则 auto_graded；两个分支都先把加权总分算
/// 出来存好。全客观 + 即时可见模式直接放出。
pub(super) async fn auto_grade(
    service: &SubmissionService,
    assignment: &Assignment,
    submission: &Submission,
) -> Result<Outcome<Submission>> {
    let questions = load_question_set(service, assignment.id, &submission.question_set).await?;
    let answers = service
        .storage
        .list_answers_by_submission(submission.id)
        .await?;

    let mut updates = Vec::new();
    let mut merged = answers.clone();
    let mut requires_manual = false;
    for question in questions.values() {
        let Some(answer) = merged.iter_mut().find(|a| a.question_id == question.id) else {
            requires_manual = true;
            continue;
        };
        match strategies::auto_score(question, answer) {
            Some(score) => {
                answer.score = Some(score);
                answer.is_auto_graded = true;
                updates.push(AnswerScoreUpdate {
                    question_id: question.id,
                    score: Some(score),
                    is_auto_graded: true,
                    feedback: None,
                });
            }
            None => requires_manual = true,
        }
    }

    let question_list: Vec<Question> = questions.values().cloned().collect();
    let score = aggregator::calculate_score(&question_list, &merged);

    let now = Utc::now();
    let immediate_release = !requires_manual && assignment.review_mode == ReviewMode::Immediate;
    let state = if requires_manual {
        SubmissionState::PendingManualGrading
    } else if immediate_release {
        SubmissionState::Released
    } else {
        SubmissionState::AutoGraded
    };

    let grade = GradeWrite {
        source_type: GradeSourceType::Submission,
        source_id: submission.id,
        user_id: submission.student_id,
        grader_id: None,
        score,
        max_score: assignment.max_score,
        is_draft: requires_manual,
        feedback: None,
        released_at: immediate_release.then_some(now),
    };

    let graded = service
        .storage
        .apply_grading_result(submission.id, updates, state, score, grade)
        .await?;

    info!(
        submission_id = submission.id,
        score, requires_manual, "auto grading finished"
    );

    let mut events = vec![DomainEvent::GradingCompleted {
        submission_id: submission.id,
        score,
        requires_manual_grading: requires_manual,
    }];
    if immediate_release {
        events.push(DomainEvent::GradesReleased {
            submission_id: submission.id,
            student_id: submission.student_id,
        });
    }
    events.extend(personal_best_events(service, assignment, &graded, score).await?);

    Ok(Outcome::with_events(graded, events))
}

/// 人工批改，pending_manual_grading 或 graded（重新批改）状态可用
pub async fn grade_manual(
    service: &SubmissionService,
    grader_id: i64,
    submission_id: i64,
    req: ManualGradeRequest,
) -> Result<Outcome<Submission>> {
    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;
    if !matches!(
        submission.state,
        SubmissionState::PendingManualGrading | SubmissionState::Graded
    ) {
        return Err(AssessmentError::not_allowed(format!(
            "提交处于 {} 状态，不能人工批改",
            submission.state
        )));
    }

    let assignment = service
        .storage
        .get_assignment_by_id(submission.assignment_id)
        .await?
        .ok_or_else(|| {
            AssessmentError::not_found(format!("作业不存在: {}", submission.assignment_id))
        })?;

    let questions = load_question_set(service, assignment.id, &submission.question_set).await?;
    let answers = service
        .storage
        .list_answers_by_submission(submission_id)
        .await?;

    let mut updates = Vec::new();
    let mut merged = answers.clone();
    for (&question_id, &score) in &req.question_scores {
        let question = questions.get(&question_id).ok_or_else(|| {
            AssessmentError::validation(format!("题目 {question_id} 不在本次题单内"))
        })?;
        validate::score_in_range(score, question.max_score, &format!("题目 {question_id} "))?;

        if let Some(answer) = merged.iter_mut().find(|a| a.question_id == question_id) {
            answer.score = Some(score);
            answer.is_auto_graded = false;
        }
        updates.push(AnswerScoreUpdate {
            question_id,
            score: Some(score),
            is_auto_graded: false,
            feedback: req.question_feedback.get(&question_id).cloned(),
        });
    }

    // 没有显式总分覆盖时，所有答案必须都已有得分
    if req.overall_score.is_none() {
        let ungraded: Vec<i64> = merged
            .iter()
            .filter(|a| a.score.is_none())
            .map(|a| a.question_id)
            .collect();
        if !ungraded.is_empty() {
            return Err(AssessmentError::validation(format!(
                "批改不完整，以下题目尚无得分: {ungraded:?}"
            )));
        }
    }

    let question_list: Vec<Question> = questions.values().cloned().collect();
    let score = match req.overall_score {
        Some(overall) => {
            validate::score_in_range(overall, assignment.max_score, "总分")?;
            aggregator::round2(overall)
        }
        None => aggregator::calculate_score(&question_list, &merged),
    };

    let grade = GradeWrite {
        source_type: GradeSourceType::Submission,
        source_id: submission_id,
        user_id: submission.student_id,
        grader_id: Some(grader_id),
        score,
        max_score: assignment.max_score,
        is_draft: false,
        feedback: req.feedback,
        released_at: None,
    };

    let graded = service
        .storage
        .apply_grading_result(submission_id, updates, SubmissionState::Graded, score, grade)
        .await?;

    info!(submission_id, grader_id, score, "manual grading finished");

    let mut events = vec![DomainEvent::GradingCompleted {
        submission_id,
        score,
        requires_manual_grading: false,
    }];
    events.extend(personal_best_events(service, &assignment, &graded, score).await?);

    Ok(Outcome::with_events(graded, events))
}

/// graded → pending_manual_grading 的重新批改入口
pub async fn reopen_for_regrade(
    service: &SubmissionService,
    actor_id: i64,
    submission_id: i64,
) -> Result<Submission> {
    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;
    if submission.state != SubmissionState::Graded {
        return Err(AssessmentError::not_allowed(format!(
            "提交处于 {} 状态，不能退回重新批改",
            submission.state
        )));
    }

    service
        .storage
        .set_submission_state(submission_id, SubmissionState::PendingManualGrading)
        .await?;
    info!(submission_id, actor_id, "submission reopened for regrade");
    service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))
}

/// 题单内的题目，按 id 建索引
async fn load_question_set(
    service: &SubmissionService,
    assignment_id: i64,
    question_set: &[i64],
) -> Result<HashMap<i64, Question>> {
    let questions = service
        .storage
        .list_questions_by_assignment(assignment_id)
        .await?;
    Ok(questions
        .into_iter()
        .filter(|q| question_set.contains(&q.id))
        .map(|q| (q.id, q))
        .collect())
}

/// 刷新个人最好成绩：破纪录时发事件并重算课程聚合成绩
async fn personal_best_events(
    service: &SubmissionService,
    assignment: &Assignment,
    submission: &Submission,
    score: f64,
) -> Result<Vec<DomainEvent>> {
    let history = service
        .storage
        .list_submissions_by_student(assignment.id, submission.student_id)
        .await?;
    let prior_best = history
        .iter()
        .filter(|s| s.id != submission.id && s.state.counts_as_completed())
        .filter_map(|s| s.score)
        .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));

    if prior_best.is_some_and(|best| score <= best) {
        return Ok(Vec::new());
    }

    aggregator::refresh_course_grade(&service.storage, submission.student_id, assignment.course_id)
        .await?;

    Ok(vec![DomainEvent::NewHighScoreAchieved {
        assignment_id: assignment.id,
        student_id: submission.student_id,
        score,
    }])
}
