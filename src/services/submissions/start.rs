//! 开始作答：门禁校验 + 冻结题单 + 落库新尝试

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use super::SubmissionService;
use crate::config::AppConfig;
use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::assignments::entities::{Assignment, RandomizationType};
use crate::models::overrides::entities::{OverrideKind, OverrideValue};
use crate::models::submissions::{
    entities::{Submission, SubmissionState},
    requests::StartSubmissionRequest,
};
use crate::storage::NewSubmissionAttempt;

pub async fn start(
    service: &SubmissionService,
    student_id: i64,
    req: StartSubmissionRequest,
) -> Result<Outcome<Submission>> {
    let now = Utc::now();

    let assignment = service
        .storage
        .get_assignment_by_id(req.assignment_id)
        .await?
        .ok_or_else(|| {
            AssessmentError::not_found(format!("作业不存在: {}", req.assignment_id))
        })?;

    if !assignment.is_available_at(now) {
        return Err(AssessmentError::not_allowed("作业当前不可作答"));
    }

    service
        .storage
        .find_active_enrollment(student_id, assignment.course_id)
        .await?
        .ok_or_else(|| AssessmentError::forbidden("学生未选修该作业所属课程"))?;

    let check = service.gate.check(assignment.id, student_id).await?;
    if !check.passed {
        return Err(AssessmentError::not_allowed(format!(
            "前置作业未完成: {:?}",
            check.incomplete
        )));
    }

    // 已有进行中的提交：顺序路径在这里拦下，并发竞争由唯一索引兜底
    if service
        .storage
        .find_active_submission(assignment.id, student_id)
        .await?
        .is_some()
    {
        return Err(AssessmentError::not_allowed("已有进行中的提交"));
    }

    let history = service
        .storage
        .list_submissions_by_student(assignment.id, student_id)
        .await?;
    let has_completed = history.iter().any(|s| s.state.counts_as_completed());

    // retake_enabled=false 是绝对闸门，尝试次数豁免不能重新打开
    if !assignment.retake_enabled && has_completed {
        return Err(AssessmentError::not_allowed("该作业不允许重考"));
    }

    let attempts_used = history.iter().map(|s| s.attempt_number).max().unwrap_or(0);
    if let Some(max_attempts) = assignment.max_attempts {
        let extra = match service
            .overrides
            .find_active(assignment.id, student_id, OverrideKind::Attempts)
            .await?
        {
            Some(ov) => match ov.value {
                OverrideValue::Attempts {
                    additional_attempts,
                } => additional_attempts,
                _ => 0,
            },
            None => 0,
        };
        if attempts_used >= max_attempts + extra {
            return Err(AssessmentError::not_allowed("作答次数已用完"));
        }
    }

    if assignment.cooldown_minutes > 0
        && let Some(last) = history.iter().filter_map(|s| s.submitted_at).max()
    {
        let ready_at = last + chrono::Duration::minutes(assignment.cooldown_minutes as i64);
        if now < ready_at {
            return Err(AssessmentError::not_allowed(format!(
                "冷却中，{ready_at} 后可再次作答"
            )));
        }
    }

    let question_set = freeze_question_set(service, &assignment, req.seed).await?;

    // 允许重交时删除上一次已交卷的行，尝试序号从被删行的计数继续
    let allow_resubmission = AppConfig::get().grading.allow_resubmission_default;
    let replace_submission_id = if allow_resubmission {
        history
            .iter()
            .find(|s| s.state.counts_as_completed())
            .map(|s| s.id)
    } else {
        None
    };

    let submission = service
        .storage
        .create_submission_attempt(NewSubmissionAttempt {
            assignment_id: assignment.id,
            student_id,
            attempt_number: attempts_used + 1,
            is_resubmission: replace_submission_id.is_some(),
            question_set,
            replace_submission_id,
        })
        .await?;

    debug_assert_eq!(submission.state, SubmissionState::InProgress);
    info!(
        submission_id = submission.id,
        assignment_id = assignment.id,
        student_id,
        attempt = submission.attempt_number,
        resubmission = submission.is_resubmission,
        "submission started"
    );

    let event = DomainEvent::SubmissionCreated {
        submission_id: submission.id,
        assignment_id: assignment.id,
        student_id,
        attempt_number: submission.attempt_number,
    };
    Ok(Outcome::with_events(submission, vec![event]))
}

/// 按组卷方式冻结本次作答的题目 ID 列表
async fn freeze_question_set(
    service: &SubmissionService,
    assignment: &Assignment,
    seed: Option<u64>,
) -> Result<Vec<i64>> {
    let questions = service
        .storage
        .list_questions_by_assignment(assignment.id)
        .await?;
    if questions.is_empty() {
        return Err(AssessmentError::not_allowed("作业没有题目"));
    }
    let mut ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let mut rng: StdRng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    match assignment.randomization_type {
        RandomizationType::None => {}
        RandomizationType::Shuffle => ids.shuffle(&mut rng),
        RandomizationType::RandomSubset => {
            let count = assignment
                .random_subset_count
                .map(|c| c as usize)
                .unwrap_or(ids.len())
                .min(ids.len());
            ids.shuffle(&mut rng);
            ids.truncate(count);
        }
    }

    Ok(ids)
}
