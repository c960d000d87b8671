//! 交卷：完整性与迟交判定，随后同步自动评分

use chrono::Utc;
use tracing::info;

use super::{SubmissionService, grade};
use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::submissions::entities::Submission;

pub async fn submit(
    service: &SubmissionService,
    student_id: i64,
    submission_id: i64,
) -> Result<Outcome<Submission>> {
    let now = Utc::now();

    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;
    if submission.student_id != student_id {
        return Err(AssessmentError::forbidden("只能交自己的卷"));
    }
    if !submission.state.is_open() {
        return Err(AssessmentError::not_allowed(format!(
            "提交处于 {} 状态，不能交卷",
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

    // 题单内每道题都要有作答记录
    let answers = service.storage.list_answers_by_submission(submission_id).await?;
    let missing: Vec<i64> = submission
        .question_set
        .iter()
        .filter(|qid| !answers.iter().any(|a| a.question_id == **qid))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AssessmentError::validation(format!(
            "还有题目未作答: {missing:?}"
        )));
    }

    // 迟交判定与作答时的截止检查同一套规则
    let is_late = service
        .overrides
        .is_submission_late(&assignment, student_id, now)
        .await?;
    if is_late && !assignment.allow_late_submission {
        return Err(AssessmentError::not_allowed("已过截止时间，作业不接受迟交"));
    }

    let submitted = service
        .storage
        .finalize_submission(submission_id, now, is_late)
        .await?
        .ok_or_else(|| AssessmentError::conflict("提交状态已被并发修改"))?;

    info!(
        submission_id,
        assignment_id = assignment.id,
        student_id,
        is_late,
        "submission finalized"
    );

    let mut events = vec![DomainEvent::AttemptCompleted {
        submission_id,
        assignment_id: assignment.id,
        student_id,
        is_late,
    }];

    // 同步自动评分
    let graded = grade::auto_grade(service, &assignment, &submitted).await?;
    events.extend(graded.events);

    Ok(Outcome::with_events(graded.value, events))
}
