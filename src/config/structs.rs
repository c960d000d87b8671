use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub grading: GradingConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            system_name: "assessment-core".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "assessment.db".to_string(),
            pool_size: 8,
            timeout: 10,
        }
    }
}

/// 上传配置（文件上传型答案的落盘目录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,     // 上传目录
    pub max_size: usize, // 单文件最大字节数
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_size: 16 * 1024 * 1024,
        }
    }
}

/// 评分与提交策略配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    // 限时作业交卷宽限（秒）
    pub time_limit_grace_seconds: i64,
    // 作业未显式配置时，是否允许重交覆盖旧提交
    pub allow_resubmission_default: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            time_limit_grace_seconds: 60,
            allow_resubmission_default: true,
        }
    }
}
