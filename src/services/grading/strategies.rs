//! 按题目类型分派的自动评分策略
//!
//! 每个策略是 (question, answer) -> Option<f64> 的纯函数：客观题按
//! 答案键精确比对给满分或零分；主观题返回 None 交给人工批改。答案键
//! 缺失的客观题同样返回 None，宁可多走一遍人工也不给错误分数。

use std::collections::HashSet;

use crate::models::answers::entities::Answer;
use crate::models::questions::entities::{Question, QuestionKind};

/// 自动评分入口
pub fn auto_score(question: &Question, answer: &Answer) -> Option<f64> {
    match question.kind {
        QuestionKind::MultipleChoice | QuestionKind::TrueFalse => {
            score_exact_match(question, answer)
        }
        QuestionKind::Checkbox => score_set_match(question, answer),
        QuestionKind::Essay | QuestionKind::FileUpload => None,
    }
}

/// 单选/判断：作答内容与答案键字符串精确比对
fn score_exact_match(question: &Question, answer: &Answer) -> Option<f64> {
    let key = question.answer_key.as_ref()?.as_str()?.to_string();
    let given = answer.content.as_deref().unwrap_or("");
    if given == key {
        Some(question.max_score)
    } else {
        Some(0.0)
    }
}

/// 多选：选项集合完全一致才得分，多选或漏选都算错
fn score_set_match(question: &Question, answer: &Answer) -> Option<f64> {
    let key: HashSet<String> = question
        .answer_key
        .as_ref()?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    let given: HashSet<String> = answer
        .selected_options
        .as_deref()
        .unwrap_or_default()
        .iter()
        .cloned()
        .collect();

    if given == key {
        Some(question.max_score)
    } else {
        Some(0.0)
    }
}
