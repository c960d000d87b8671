use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 豁免类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Deadline,     // 延长截止时间
    Attempts,     // 追加尝试次数
    Prerequisite, // 绕过前置要求
}

impl<'de> Deserialize<'de> for OverrideKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的豁免类型: '{s}'. 支持: deadline, attempts, prerequisite"
            ))
        })
    }
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideKind::Deadline => write!(f, "deadline"),
            OverrideKind::Attempts => write!(f, "attempts"),
            OverrideKind::Prerequisite => write!(f, "prerequisite"),
        }
    }
}

impl std::str::FromStr for OverrideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deadline" => Ok(OverrideKind::Deadline),
            "attempts" => Ok(OverrideKind::Attempts),
            "prerequisite" => Ok(OverrideKind::Prerequisite),
            _ => Err(format!("Invalid override kind: {s}")),
        }
    }
}

/// 豁免的类型化负载，与 kind 一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Deadline {
        extended_deadline: DateTime<Utc>,
    },
    Attempts {
        additional_attempts: i32,
    },
    Prerequisite {
        // 为空表示整体绕过；非空表示仅绕过列出的前置作业
        bypassed_prerequisites: Vec<i64>,
    },
}

/// 针对单个学生、单个作业的一条豁免
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub kind: OverrideKind,
    pub value: OverrideValue,
    pub reason: String,
    pub granted_by: i64,
    pub granted_at: DateTime<Utc>,
    // None 表示不过期
    pub expires_at: Option<DateTime<Utc>>,
}

impl Override {
    /// 是否在指定时刻仍然生效
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => expires > now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expires_at: Option<DateTime<Utc>>) -> Override {
        Override {
            id: 1,
            assignment_id: 1,
            student_id: 2,
            kind: OverrideKind::Attempts,
            value: OverrideValue::Attempts {
                additional_attempts: 2,
            },
            reason: "medical leave".into(),
            granted_by: 3,
            granted_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn test_expired_override_is_inactive() {
        let now = Utc::now();
        assert!(!sample(Some(now - Duration::hours(1))).is_active_at(now));
    }

    #[test]
    fn test_unexpired_and_unbounded_overrides_are_active() {
        let now = Utc::now();
        assert!(sample(Some(now + Duration::hours(1))).is_active_at(now));
        assert!(sample(None).is_active_at(now));
    }

    #[test]
    fn test_value_json_shapes() {
        let v: OverrideValue =
            serde_json::from_value(serde_json::json!({ "additional_attempts": 3 })).unwrap();
        assert_eq!(v, OverrideValue::Attempts {
            additional_attempts: 3
        });

        let v: OverrideValue =
            serde_json::from_value(serde_json::json!({ "bypassed_prerequisites": [1, 2] }))
                .unwrap();
        assert_eq!(v, OverrideValue::Prerequisite {
            bypassed_prerequisites: vec![1, 2]
        });
    }

    #[test]
    fn test_value_rejects_unrecognized_shape() {
        // 字段名写错的对象不得落入任何变体
        let r: Result<OverrideValue, _> =
            serde_json::from_value(serde_json::json!({ "bypassed_prereqs": [1, 2] }));
        assert!(r.is_err());

        let r: Result<OverrideValue, _> = serde_json::from_value(serde_json::json!({}));
        assert!(r.is_err());
    }
}
