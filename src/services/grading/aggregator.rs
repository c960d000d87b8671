//! 分数聚合
//!
//! 提交总分：每个已评分答案按 score / question.max_score 归一化后乘以
//! 题目权重求和，两位小数；未评分答案不计入。课程成绩：每个作业取
//! 个人最高的已交卷提交，按作业满分加权平均，百分制。

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::models::answers::entities::Answer;
use crate::models::grades::{entities::GradeSourceType, requests::GradeWrite};
use crate::models::questions::entities::Question;
use crate::storage::Storage;

/// 两位小数四舍五入
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 从当前答案确定性地计算提交总分；没有任何已评分答案时为 0.0
pub fn calculate_score(questions: &[Question], answers: &[Answer]) -> f64 {
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut total = 0.0;
    let mut any_scored = false;
    for answer in answers {
        let Some(score) = answer.score else { continue };
        let Some(question) = by_id.get(&answer.question_id) else {
            continue;
        };
        if question.max_score <= 0.0 {
            continue;
        }
        total += score / question.max_score * question.weight;
        any_scored = true;
    }

    if any_scored { round2(total) } else { 0.0 }
}

/// 课程成绩：个人最好成绩按作业满分加权的百分制平均
pub async fn calculate_course_grade(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    course_id: i64,
) -> Result<f64> {
    let assignments = storage.list_assignments_by_course(course_id).await?;

    let mut earned = 0.0;
    let mut weight = 0.0;
    for assignment in &assignments {
        if assignment.max_score <= 0.0 {
            continue;
        }
        let submissions = storage
            .list_submissions_by_student(assignment.id, student_id)
            .await?;
        let best = submissions
            .iter()
            .filter(|s| s.state.counts_as_completed())
            .filter_map(|s| s.score)
            .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));

        if let Some(best) = best {
            earned += best;
            weight += assignment.max_score;
        }
    }

    if weight <= 0.0 {
        return Ok(0.0);
    }
    Ok(round2(earned / weight * 100.0))
}

/// 重算并落库课程聚合成绩行
pub async fn refresh_course_grade(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    course_id: i64,
) -> Result<()> {
    let score = calculate_course_grade(storage, student_id, course_id).await?;
    storage
        .upsert_grade(GradeWrite {
            source_type: GradeSourceType::Course,
            source_id: course_id,
            user_id: student_id,
            grader_id: None,
            score,
            max_score: 100.0,
            is_draft: false,
            feedback: None,
            released_at: None,
        })
        .await?;
    Ok(())
}
