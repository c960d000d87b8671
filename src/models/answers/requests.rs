use serde::Deserialize;

/// 单题得分写入（自动评分与人工批改共用）
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerScoreUpdate {
    pub question_id: i64,
    pub score: Option<f64>,
    pub is_auto_graded: bool,
    pub feedback: Option<String>,
}
