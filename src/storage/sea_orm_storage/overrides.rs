//! 豁免存储操作

use super::SeaOrmStorage;
use crate::entity::overrides::{ActiveModel, Column, Entity as Overrides};
use crate::errors::{AssessmentError, Result};
use crate::models::overrides::entities::{Override, OverrideKind, OverrideValue};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 授予豁免
    #[allow(clippy::too_many_arguments)]
    pub async fn create_override_impl(
        &self,
        granted_by: i64,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        value: OverrideValue,
        reason: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Override> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            kind: Set(kind.to_string()),
            value: Set(serde_json::to_string(&value)?),
            reason: Set(reason),
            granted_by: Set(granted_by),
            granted_at: Set(chrono::Utc::now().timestamp()),
            expires_at: Set(expires_at.map(|d| d.timestamp())),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建豁免失败: {e}")))?;

        result.try_into_override()
    }

    /// 查找某类型当前生效的豁免，多条时取最新授予的一条
    pub async fn find_active_override_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
        now: DateTime<Utc>,
    ) -> Result<Option<Override>> {
        let result = Overrides::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Kind.eq(kind.to_string()))
            .filter(
                Condition::any()
                    .add(Expr::col(Column::ExpiresAt).is_null())
                    .add(Column::ExpiresAt.gt(now.timestamp())),
            )
            .order_by_desc(Column::GrantedAt)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询豁免失败: {e}")))?;

        result.map(|m| m.try_into_override()).transpose()
    }
}
