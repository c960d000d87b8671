use serde::Serialize;

use super::entities::Question;

/// 题目权重软校验提示
///
/// 创建题目时权重总和超过作业满分只作提示不阻断，发布时硬校验。
#[derive(Debug, Clone, Serialize)]
pub struct WeightAdvisory {
    pub total_weight: f64,
    pub assignment_max_score: f64,
    pub exceeds_max_score: bool,
}

/// 添加题目响应
#[derive(Debug, Clone, Serialize)]
pub struct CreateQuestionResponse {
    pub question: Question,
    pub advisory: WeightAdvisory,
}
