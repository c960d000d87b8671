use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一道题目的作答，属于唯一的 (submission, question) 对
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    // 文本作答（简答题）
    pub content: Option<String>,
    // 选择类作答
    pub selected_options: Option<Vec<String>>,
    // 文件作答的对象存储引用路径
    pub file_paths: Option<Vec<String>>,
    // None 表示尚未评分
    pub score: Option<f64>,
    pub is_auto_graded: bool,
    pub feedback: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Answer {
    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }
}
