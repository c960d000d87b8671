use serde::Deserialize;

/// 提交申诉请求
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAppealRequest {
    pub submission_id: i64,
    pub reason: String,
    // 已上传佐证材料的引用路径
    pub documents: Option<Vec<String>>,
}
