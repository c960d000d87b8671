//! 迟交裁定申诉
//!
//! 每个提交最多一条申诉，裁决单次有效。批准即视学生为未迟交（同事务
//! 清除提交上的迟交标记），驳回只动申诉本身并要求说明理由。

use std::sync::Arc;

use tracing::info;

use crate::errors::{AssessmentError, Result};
use crate::events::{DomainEvent, Outcome};
use crate::models::appeals::{
    entities::{Appeal, AppealStatus},
    requests::SubmitAppealRequest,
};
use crate::storage::Storage;
use crate::utils::validate;

pub struct AppealService {
    storage: Arc<dyn Storage>,
}

impl AppealService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 学生对迟交裁定发起申诉
    pub async fn submit(
        &self,
        student_id: i64,
        req: SubmitAppealRequest,
    ) -> Result<Outcome<Appeal>> {
        validate::non_empty(&req.reason, "申诉理由")?;

        let submission = self
            .storage
            .get_submission_by_id(req.submission_id)
            .await?
            .ok_or_else(|| {
                AssessmentError::not_found(format!("提交不存在: {}", req.submission_id))
            })?;
        if submission.student_id != student_id {
            return Err(AssessmentError::forbidden("只能为自己的提交申诉"));
        }
        if !submission.is_late {
            return Err(AssessmentError::not_allowed("提交未被判为迟交，无需申诉"));
        }
        if self
            .storage
            .get_appeal_by_submission(req.submission_id)
            .await?
            .is_some()
        {
            return Err(AssessmentError::conflict("该提交已有申诉"));
        }

        let appeal = self
            .storage
            .create_appeal(student_id, req.submission_id, req.reason, req.documents)
            .await?;

        info!(appeal_id = appeal.id, submission_id = appeal.submission_id, "appeal submitted");

        let event = DomainEvent::AppealSubmitted {
            appeal_id: appeal.id,
            submission_id: appeal.submission_id,
        };
        Ok(Outcome::with_events(appeal, vec![event]))
    }

    /// 批准申诉并清除迟交标记
    pub async fn approve(&self, actor_id: i64, appeal_id: i64) -> Result<Outcome<Appeal>> {
        self.decide(actor_id, appeal_id, AppealStatus::Approved, None)
            .await
    }

    /// 驳回申诉，必须给出说明
    pub async fn deny(
        &self,
        actor_id: i64,
        appeal_id: i64,
        note: String,
    ) -> Result<Outcome<Appeal>> {
        validate::non_empty(&note, "驳回说明")?;
        self.decide(actor_id, appeal_id, AppealStatus::Denied, Some(note))
            .await
    }

    async fn decide(
        &self,
        actor_id: i64,
        appeal_id: i64,
        status: AppealStatus,
        note: Option<String>,
    ) -> Result<Outcome<Appeal>> {
        let appeal = self
            .storage
            .get_appeal_by_id(appeal_id)
            .await?
            .ok_or_else(|| AssessmentError::not_found(format!("申诉不存在: {appeal_id}")))?;
        if appeal.status.is_decided() {
            return Err(AssessmentError::validation("申诉已裁决"));
        }

        let approved = status == AppealStatus::Approved;
        let decided = self
            .storage
            .decide_appeal(appeal_id, status, actor_id, note, approved)
            .await?;

        info!(appeal_id, actor_id, approved, "appeal decided");

        let event = DomainEvent::AppealDecided {
            appeal_id,
            submission_id: decided.submission_id,
            approved,
        };
        Ok(Outcome::with_events(decided, vec![event]))
    }
}
