//! 豁免登记与截止时间判定
//!
//! 三类豁免：延长截止、追加尝试次数、绕过前置。负载在授予时按类型
//! 校验后原子落库；截止相关的判定统一从这里走，保证"豁免窗口内不算
//! 迟交"的语义只有一份。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::assignments::entities::Assignment;
use crate::models::overrides::{
    entities::{Override, OverrideKind, OverrideValue},
    requests::GrantOverrideRequest,
};
use crate::storage::Storage;
use crate::utils::validate;

pub struct OverrideService {
    storage: Arc<dyn Storage>,
}

impl OverrideService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 授予豁免
    pub async fn grant(&self, actor_id: i64, req: GrantOverrideRequest) -> Result<Outcome<Override>> {
        validate::non_empty(&req.reason, "豁免理由")?;

        self.storage
            .get_assignment_by_id(req.assignment_id)
            .await?
            .ok_or_else(|| {
                AssessmentError::not_found(format!("作业不存在: {}", req.assignment_id))
            })?;

        let value = self.parse_value(req.kind, req.value, req.assignment_id).await?;

        // 同一 (作业, 学生, 类型) 最多一条生效豁免
        if self
            .has_active(req.assignment_id, req.student_id, req.kind)
            .await?
        {
            return Err(AssessmentError::conflict(format!(
                "该学生已有生效的 {} 豁免",
                req.kind
            )));
        }

        let granted = self
            .storage
            .create_override(
                actor_id,
                req.assignment_id,
                req.student_id,
                req.kind,
                value,
                req.reason,
                req.expires_at,
            )
            .await?;

        info!(
            override_id = granted.id,
            assignment_id = granted.assignment_id,
            student_id = granted.student_id,
            kind = %granted.kind,
            "override granted"
        );

        let event = DomainEvent::OverrideGranted {
            override_id: granted.id,
            assignment_id: granted.assignment_id,
            student_id: granted.student_id,
            kind: granted.kind.to_string(),
        };
        Ok(Outcome::with_events(granted, vec![event]))
    }

    /// 按类型校验豁免负载
    ///
    /// 按 kind 分别反序列化并拒绝未知字段，写错字段名的负载直接报
    /// Validation，而不是落入某个变体的默认值。
    async fn parse_value(
        &self,
        kind: OverrideKind,
        raw: serde_json::Value,
        assignment_id: i64,
    ) -> Result<OverrideValue> {
        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct DeadlinePayload {
            extended_deadline: DateTime<Utc>,
        }

        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct AttemptsPayload {
            additional_attempts: i32,
        }

        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct PrerequisitePayload {
            bypassed_prerequisites: Vec<i64>,
        }

        let mismatch =
            |e: serde_json::Error| AssessmentError::validation(format!("豁免负载格式错误: {e}"));

        match kind {
            OverrideKind::Deadline => {
                let p: DeadlinePayload = serde_json::from_value(raw).map_err(mismatch)?;
                if p.extended_deadline <= Utc::now() {
                    return Err(AssessmentError::validation(
                        "延长后的截止时间必须在未来",
                    ));
                }
                Ok(OverrideValue::Deadline {
                    extended_deadline: p.extended_deadline,
                })
            }
            OverrideKind::Attempts => {
                let p: AttemptsPayload = serde_json::from_value(raw).map_err(mismatch)?;
                if p.additional_attempts <= 0 {
                    return Err(AssessmentError::validation("追加尝试次数必须为正整数"));
                }
                Ok(OverrideValue::Attempts {
                    additional_attempts: p.additional_attempts,
                })
            }
            OverrideKind::Prerequisite => {
                let p: PrerequisitePayload = serde_json::from_value(raw).map_err(mismatch)?;
                let real: std::collections::HashSet<i64> = self
                    .storage
                    .list_prerequisites(assignment_id)
                    .await?
                    .into_iter()
                    .collect();
                for id in &p.bypassed_prerequisites {
                    if !real.contains(id) {
                        return Err(AssessmentError::validation(format!(
                            "{id} 不是该作业的前置作业"
                        )));
                    }
                }
                Ok(OverrideValue::Prerequisite {
                    bypassed_prerequisites: p.bypassed_prerequisites,
                })
            }
        }
    }

    /// 查找当前生效的豁免
    pub async fn find_active(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
    ) -> Result<Option<Override>> {
        self.storage
            .find_active_override(assignment_id, student_id, kind, Utc::now())
            .await
    }

    pub async fn has_active(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: OverrideKind,
    ) -> Result<bool> {
        Ok(self.find_active(assignment_id, student_id, kind).await?.is_some())
    }

    /// 学生的有效截止时间
    ///
    /// 生效的截止豁免取代 deadline_at + tolerance_minutes；None 表示无限期。
    pub async fn effective_deadline(
        &self,
        assignment: &Assignment,
        student_id: i64,
    ) -> Result<Option<DateTime<Utc>>> {
        if let Some(ov) = self
            .find_active(assignment.id, student_id, OverrideKind::Deadline)
            .await?
            && let OverrideValue::Deadline { extended_deadline } = ov.value
        {
            return Ok(Some(extended_deadline));
        }
        Ok(assignment.deadline_with_tolerance())
    }

    /// 指定时刻是否仍在有效截止时间内
    pub async fn check_deadline_with_override(
        &self,
        assignment: &Assignment,
        student_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.effective_deadline(assignment, student_id).await? {
            Some(deadline) => Ok(at <= deadline),
            None => Ok(true),
        }
    }

    /// 指定时刻提交是否算迟交
    pub async fn is_submission_late(
        &self,
        assignment: &Assignment,
        student_id: i64,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(!self
            .check_deadline_with_override(assignment, student_id, at)
            .await?)
    }
}
