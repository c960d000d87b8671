//! 记录作答：只在进行中、截止前、限时内接受，按 (submission, question) 覆盖

use chrono::Utc;

use super::SubmissionService;
use crate::config::AppConfig;
use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::answers::entities::Answer;
use crate::models::submissions::requests::RecordAnswerRequest;
use crate::storage::AnswerWrite;

pub async fn record_answer(
    service: &SubmissionService,
    student_id: i64,
    submission_id: i64,
    question_id: i64,
    req: RecordAnswerRequest,
) -> Result<Outcome<Answer>> {
    let now = Utc::now();

    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;
    if submission.student_id != student_id {
        return Err(AssessmentError::forbidden("只能作答自己的提交"));
    }
    if !submission.state.is_open() {
        return Err(AssessmentError::not_allowed(format!(
            "提交处于 {} 状态，不能作答",
            submission.state
        )));
    }
    if !submission.question_set.contains(&question_id) {
        return Err(AssessmentError::validation(format!(
            "题目 {question_id} 不在本次作答的题单内"
        )));
    }

    let assignment = service
        .storage
        .get_assignment_by_id(submission.assignment_id)
        .await?
        .ok_or_else(|| {
            AssessmentError::not_found(format!("作业不存在: {}", submission.assignment_id))
        })?;

    if !service
        .overrides
        .check_deadline_with_override(&assignment, student_id, now)
        .await?
    {
        return Err(AssessmentError::not_allowed("已过截止时间"));
    }

    if let Some(limit) = assignment.time_limit_minutes {
        let grace = AppConfig::get().grading.time_limit_grace_seconds;
        if !within_time_limit(submission.started_at, limit, grace, now) {
            return Err(AssessmentError::not_allowed("已超出作答时限"));
        }
    }

    // 文件作答先落对象存储，核心只保留返回的引用路径
    let mut file_paths = Vec::new();
    for upload in &req.files {
        let path = service.objects.put(&upload.file_name, &upload.bytes).await?;
        file_paths.push(path);
    }

    let answer = service
        .storage
        .upsert_answer(
            submission_id,
            question_id,
            AnswerWrite {
                content: req.content,
                selected_options: req.selected_options,
                file_paths: (!file_paths.is_empty()).then_some(file_paths),
            },
        )
        .await?;

    let event = DomainEvent::AnswerRecorded {
        submission_id,
        question_id,
    };
    Ok(Outcome::with_events(answer, vec![event]))
}

/// 限时判定：开始时间 + 限时 + 宽限秒数之内（含边界）可作答
fn within_time_limit(
    started_at: chrono::DateTime<Utc>,
    limit_minutes: i32,
    grace_seconds: i64,
    now: chrono::DateTime<Utc>,
) -> bool {
    let cutoff = started_at
        + chrono::Duration::minutes(limit_minutes as i64)
        + chrono::Duration::seconds(grace_seconds);
    now <= cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_within_limit_before_expiry() {
        let started = Utc::now();
        assert!(within_time_limit(
            started,
            30,
            60,
            started + Duration::minutes(29)
        ));
    }

    #[test]
    fn test_grace_window_extends_past_nominal_limit() {
        let started = Utc::now();
        // 名义时限已过，但仍在 60 秒宽限内
        assert!(within_time_limit(
            started,
            30,
            60,
            started + Duration::minutes(30) + Duration::seconds(59)
        ));
        // 宽限边界本身仍可作答
        assert!(within_time_limit(
            started,
            30,
            60,
            started + Duration::minutes(30) + Duration::seconds(60)
        ));
    }

    #[test]
    fn test_expired_past_grace_is_rejected() {
        let started = Utc::now();
        assert!(!within_time_limit(
            started,
            30,
            60,
            started + Duration::minutes(30) + Duration::seconds(61)
        ));
        assert!(!within_time_limit(started, 30, 60, started + Duration::hours(2)));
    }
}
