use serde::Deserialize;
use std::collections::HashMap;

/// 开始作答请求
#[derive(Debug, Clone, Deserialize)]
pub struct StartSubmissionRequest {
    pub assignment_id: i64,
    // 随机抽题种子，不传则使用系统随机源
    pub seed: Option<u64>,
}

/// 文件作答的原始上传内容，核心只保留对象存储返回的引用路径
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 记录答案请求（按 (submission, question) 幂等覆盖）
#[derive(Debug, Clone, Default)]
pub struct RecordAnswerRequest {
    pub content: Option<String>,
    pub selected_options: Option<Vec<String>>,
    pub files: Vec<UploadPayload>,
}

/// 人工批改请求
#[derive(Debug, Clone, Deserialize)]
pub struct ManualGradeRequest {
    // question_id -> 得分
    pub question_scores: HashMap<i64, f64>,
    #[serde(default)]
    pub question_feedback: HashMap<i64, String>,
    pub feedback: Option<String>,
    // 显式总分覆盖；不传时要求所有答案均已有得分
    pub overall_score: Option<f64>,
}
