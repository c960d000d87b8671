//! 文件对象存储接口
//!
//! 文件作答只在核心内保留返回的引用路径，字节落盘交给协作方；核心不做重试。

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::errors::{AssessmentError, Result};

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// 存储一份文件内容，返回引用路径
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// 本地磁盘实现，按随机 token 落盘避免文件名冲突
pub struct LocalObjectStore {
    base_dir: PathBuf,
    max_size: usize,
}

impl LocalObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_size,
        }
    }

    pub fn from_config() -> Self {
        let config = AppConfig::get();
        Self::new(&config.upload.dir, config.upload.max_size)
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        if bytes.len() > self.max_size {
            return Err(AssessmentError::validation(format!(
                "文件超出大小限制: {} > {}",
                bytes.len(),
                self.max_size
            )));
        }

        let token = uuid::Uuid::new_v4().to_string();
        // 只取文件名部分，丢弃调用方传入的任何路径前缀
        let safe_name = std::path::Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        let dir = self.base_dir.join(&token);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(safe_name);
        tokio::fs::write(&path, bytes).await?;

        Ok(path.to_string_lossy().into_owned())
    }
}
