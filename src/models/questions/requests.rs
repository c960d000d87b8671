use serde::Deserialize;

use super::entities::QuestionKind;

/// 添加题目请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Option<Vec<String>>,
    pub weight: f64,
    pub max_score: f64,
    pub answer_key: Option<serde_json::Value>,
    #[serde(default)]
    pub position: i32,
}
