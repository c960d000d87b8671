//! 领域事件出箱
//!
//! 核心逻辑不直接触发通知副作用：每个状态变更返回 `Outcome`，事件随结果一并
//! 带出，由外层适配器在事务提交后通过 `EventSink` 投递。

use serde::Serialize;

/// 领域事件，投递格式由外部通知系统决定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    SubmissionCreated {
        submission_id: i64,
        assignment_id: i64,
        student_id: i64,
        attempt_number: i32,
    },
    AnswerRecorded {
        submission_id: i64,
        question_id: i64,
    },
    AttemptCompleted {
        submission_id: i64,
        assignment_id: i64,
        student_id: i64,
        is_late: bool,
    },
    GradingCompleted {
        submission_id: i64,
        score: f64,
        requires_manual_grading: bool,
    },
    GradesReleased {
        submission_id: i64,
        student_id: i64,
    },
    OverrideGranted {
        override_id: i64,
        assignment_id: i64,
        student_id: i64,
        kind: String,
    },
    AppealSubmitted {
        appeal_id: i64,
        submission_id: i64,
    },
    AppealDecided {
        appeal_id: i64,
        submission_id: i64,
        approved: bool,
    },
    NewHighScoreAchieved {
        assignment_id: i64,
        student_id: i64,
        score: f64,
    },
}

/// 状态变更结果：返回值 + 待投递事件
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<DomainEvent>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    pub fn with_events(value: T, events: Vec<DomainEvent>) -> Self {
        Self { value, events }
    }

    pub fn push(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}

/// 事件投递接口，由外部通知系统实现
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent);

    fn publish_all(&self, events: &[DomainEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

/// 仅记录日志的投递实现，也用于测试
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &DomainEvent) {
        tracing::info!(?event, "domain event published");
    }
}
