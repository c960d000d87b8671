use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::OverrideKind;

/// 授予豁免请求
///
/// value 为类型相关负载，由 OverrideService 按 kind 校验后落库。
#[derive(Debug, Clone, Deserialize)]
pub struct GrantOverrideRequest {
    pub assignment_id: i64,
    pub student_id: i64,
    pub kind: OverrideKind,
    pub reason: String,
    pub value: serde_json::Value,
    pub expires_at: Option<DateTime<Utc>>,
}
