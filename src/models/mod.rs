//! 业务数据模型
//!
//! 与 entity 模块的数据库实体分离：Storage 层做 CRUD 后转换为这里的业务实体。

pub mod answers;
pub mod appeals;
pub mod assignments;
pub mod common;
pub mod enrollments;
pub mod grades;
pub mod overrides;
pub mod questions;
pub mod submissions;

pub use common::bulk::{BulkOperationError, BulkOperationResult};
