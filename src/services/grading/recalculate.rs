//! 答案键变更后的后台重算
//!
//! 教师改动答案键后，把该题所有自动评分的历史答案重打一遍分，再逐个
//! 提交重算总分。人工给出的分数一律不动。单个提交失败只记日志，不
//! 阻塞其余提交的重算。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::{AssessmentError, Result};
use crate::models::answers::requests::AnswerScoreUpdate;
use crate::services::grading::{aggregator, strategies};
use crate::storage::Storage;

/// 派发后台重算任务
pub fn spawn_answer_key_recalculation(storage: Arc<dyn Storage>, question_id: i64) {
    tokio::spawn(async move {
        if let Err(e) = recalculate_question(&storage, question_id).await {
            error!(question_id, error = %e, "answer key recalculation failed");
        }
    });
}

/// 重算一道题的全部自动评分答案及受影响提交的总分
pub async fn recalculate_question(storage: &Arc<dyn Storage>, question_id: i64) -> Result<()> {
    let question = storage
        .get_question_by_id(question_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("题目不存在: {question_id}")))?;

    let answers = storage.list_answers_by_question(question_id).await?;

    let mut touched_submissions: HashSet<i64> = HashSet::new();
    for answer in answers {
        // 人工打过的分不动
        if !answer.is_auto_graded {
            continue;
        }
        let Some(new_score) = strategies::auto_score(&question, &answer) else {
            continue;
        };

        let submission_id = answer.submission_id;
        let update = AnswerScoreUpdate {
            question_id,
            score: Some(new_score),
            is_auto_graded: true,
            feedback: answer.feedback.clone(),
        };
        if let Err(e) = storage.update_answer_score(submission_id, update).await {
            warn!(submission_id, question_id, error = %e, "answer rescore failed, skipping");
            continue;
        }
        touched_submissions.insert(submission_id);
    }

    let mut failed = 0usize;
    for submission_id in &touched_submissions {
        if let Err(e) = recalculate_submission_total(storage, *submission_id).await {
            warn!(submission_id, error = %e, "submission total recalculation failed");
            failed += 1;
        }
    }

    info!(
        question_id,
        submissions = touched_submissions.len(),
        failed,
        "answer key recalculation finished"
    );
    Ok(())
}

async fn recalculate_submission_total(
    storage: &Arc<dyn Storage>,
    submission_id: i64,
) -> Result<()> {
    let submission = storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AssessmentError::not_found(format!("提交不存在: {submission_id}")))?;
    let questions = storage
        .list_questions_by_assignment(submission.assignment_id)
        .await?;
    let answers = storage.list_answers_by_submission(submission_id).await?;

    let score = aggregator::calculate_score(&questions, &answers);
    storage.update_submission_score(submission_id, score).await?;
    Ok(())
}
