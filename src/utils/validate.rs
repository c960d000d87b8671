//! 通用校验工具

use crate::errors::{AssessmentError, Result};

/// 校验文本字段非空（去除首尾空白后）
pub fn non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AssessmentError::validation(format!("{field}不能为空")));
    }
    Ok(())
}

/// 校验得分在 [0, max] 区间内
pub fn score_in_range(score: f64, max: f64, label: &str) -> Result<()> {
    if !score.is_finite() || score < 0.0 || score > max {
        return Err(AssessmentError::validation(format!(
            "{label}得分 {score} 超出范围 [0, {max}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(non_empty("ok", "理由").is_ok());
        assert!(non_empty("   ", "理由").is_err());
        assert!(non_empty("", "理由").is_err());
    }

    #[test]
    fn test_score_in_range() {
        assert!(score_in_range(0.0, 10.0, "Q1").is_ok());
        assert!(score_in_range(10.0, 10.0, "Q1").is_ok());
        assert!(score_in_range(-0.1, 10.0, "Q1").is_err());
        assert!(score_in_range(10.1, 10.0, "Q1").is_err());
        assert!(score_in_range(f64::NAN, 10.0, "Q1").is_err());
    }
}
