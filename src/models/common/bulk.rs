use serde::Serialize;

/// 批量操作的单项错误
#[derive(Debug, Clone, Serialize)]
pub struct BulkOperationError {
    pub id: i64,
    pub error: String,
}

/// 批量操作结果（部分成功语义：单项失败不回滚其他项）
#[derive(Debug, Clone, Serialize, Default)]
pub struct BulkOperationResult {
    pub succeeded: Vec<i64>,
    pub failed: Vec<i64>,
    pub errors: Vec<BulkOperationError>,
}

impl BulkOperationResult {
    pub fn record_success(&mut self, id: i64) {
        self.succeeded.push(id);
    }

    pub fn record_failure(&mut self, id: i64, error: impl Into<String>) {
        self.failed.push(id);
        self.errors.push(BulkOperationError {
            id,
            error: error.into(),
        });
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
