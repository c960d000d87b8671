use serde::{Deserialize, Serialize};

// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice, // 单选
    TrueFalse,      // 判断
    Checkbox,       // 多选
    Essay,          // 简答/论述
    FileUpload,     // 文件作答
}

impl QuestionKind {
    /// 是否可由客观答案键自动评分
    pub fn is_auto_gradable(&self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse | QuestionKind::Checkbox
        )
    }
}

impl<'de> Deserialize<'de> for QuestionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的题目类型: '{s}'. 支持: multiple_choice, true_false, checkbox, essay, file_upload"
            ))
        })
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
            QuestionKind::TrueFalse => write!(f, "true_false"),
            QuestionKind::Checkbox => write!(f, "checkbox"),
            QuestionKind::Essay => write!(f, "essay"),
            QuestionKind::FileUpload => write!(f, "file_upload"),
        }
    }
}

impl std::str::FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "true_false" => Ok(QuestionKind::TrueFalse),
            "checkbox" => Ok(QuestionKind::Checkbox),
            "essay" => Ok(QuestionKind::Essay),
            "file_upload" => Ok(QuestionKind::FileUpload),
            _ => Err(format!("Invalid question kind: {s}")),
        }
    }
}

/// 题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub assignment_id: i64,
    pub kind: QuestionKind,
    pub prompt: String,
    // 选择类题目的候选项
    pub options: Option<Vec<String>>,
    // 题目在总分中的权重
    pub weight: f64,
    pub max_score: f64,
    // 客观题答案键；主观题为 None
    pub answer_key: Option<serde_json::Value>,
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_gradable_kinds() {
        assert!(QuestionKind::MultipleChoice.is_auto_gradable());
        assert!(QuestionKind::TrueFalse.is_auto_gradable());
        assert!(QuestionKind::Checkbox.is_auto_gradable());
        assert!(!QuestionKind::Essay.is_auto_gradable());
        assert!(!QuestionKind::FileUpload.is_auto_gradable());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            QuestionKind::MultipleChoice,
            QuestionKind::TrueFalse,
            QuestionKind::Checkbox,
            QuestionKind::Essay,
            QuestionKind::FileUpload,
        ] {
            assert_eq!(kind.to_string().parse::<QuestionKind>().unwrap(), kind);
        }
    }
}
