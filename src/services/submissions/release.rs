//! 放出成绩：单个与批量（部分成功语义）

use chrono::Utc;
use tracing::info;

use super::SubmissionService;
use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::common::bulk::BulkOperationResult;
use crate::models::grades::entities::Grade;

pub async fn release(
    service: &SubmissionService,
    actor_id: i64,
    submission_id: i64,
) -> Result<Outcome<Grade>> {
    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;

    let grade = service
        .storage
        .get_submission_grade(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交 {submission_id} 尚无成绩")))?;

    if grade.is_draft {
        return Err(AssessmentError::not_allowed("草稿成绩不能放出"));
    }
    if grade.is_released() {
        return Err(AssessmentError::not_allowed("成绩已放出"));
    }

    let released = service
        .storage
        .release_submission(submission_id, Utc::now())
        .await?;

    info!(
        submission_id,
        actor_id,
        student_id = submission.student_id,
        "grade released"
    );

    let event = DomainEvent::GradesReleased {
        submission_id,
        student_id: submission.student_id,
    };
    Ok(Outcome::with_events(released, vec![event]))
}

/// 逐项校验并放出，单项失败不影响其余项
pub async fn release_bulk(
    service: &SubmissionService,
    actor_id: i64,
    submission_ids: &[i64],
) -> Result<Outcome<BulkOperationResult>> {
    let mut result = BulkOperationResult::default();
    let mut events = Vec::new();

    for &submission_id in submission_ids {
        match release(service, actor_id, submission_id).await {
            Ok(outcome) => {
                result.record_success(submission_id);
                events.extend(outcome.events);
            }
            Err(e) => {
                result.record_failure(submission_id, e.to_string());
            }
        }
    }

    info!(
        actor_id,
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "bulk release finished"
    );
    Ok(Outcome::with_events(result, events))
}
