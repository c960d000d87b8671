//! Assessment Core - 在线学习平台的评测核心
//!
//! 提交/尝试生命周期状态机，以及围绕它的豁免与前置门禁、按题型自动
//! 评分、分数聚合和迟交申诉。HTTP 路由、鉴权、通知投递、文件存储等
//! 均为外部协作方，核心只通过 trait 与之对接。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `events`: 领域事件出箱
//! - `models`: 数据模型定义
//! - `services`: 业务逻辑层（生命周期、门禁、评分、申诉）
//! - `storage`: 数据存储层（SeaORM）与对象存储接口
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
