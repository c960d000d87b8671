//! 前置作业边存储操作

use super::SeaOrmStorage;
use crate::entity::assignment_prerequisites::{
    ActiveModel, Column, Entity as AssignmentPrerequisites,
};
use crate::errors::{AssessmentError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

impl SeaOrmStorage {
    /// 插入一条前置边；重复边由唯一索引拦截为 Conflict
    pub async fn add_prerequisite_edge_impl(
        &self,
        assignment_id: i64,
        prerequisite_id: i64,
    ) -> Result<()> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            prerequisite_id: Set(prerequisite_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_err("插入前置边失败", e))?;

        Ok(())
    }

    /// 某作业的直接前置作业 ID
    pub async fn list_prerequisites_impl(&self, assignment_id: i64) -> Result<Vec<i64>> {
        let ids = AssignmentPrerequisites::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .select_only()
            .column(Column::PrerequisiteId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询前置作业失败: {e}")))?;

        Ok(ids)
    }

    /// 全量前置边 (assignment_id, prerequisite_id)，环检测用
    pub async fn list_all_prerequisite_edges_impl(&self) -> Result<Vec<(i64, i64)>> {
        let edges = AssignmentPrerequisites::find()
            .select_only()
            .column(Column::AssignmentId)
            .column(Column::PrerequisiteId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询前置边失败: {e}")))?;

        Ok(edges)
    }
}
