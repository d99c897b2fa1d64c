// ==========================================
// HTM Vault - 标识生成
// ==========================================
// 格式: 前缀 + N 位大写字母数字（取自 UUID v4 的十六进制）
// 冲突: 由调用方查重后重试
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use uuid::Uuid;

/// 单次生成允许的最大重试次数
pub const MAX_GENERATION_ATTEMPTS: usize = 16;

/// 生成一个候选标识
pub fn generate_id(prefix: &str, length: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    let take = length.min(hex.len());
    format!("{}{}", prefix, &hex[..take])
}

/// 生成不与已有记录冲突的标识
///
/// `exists` 返回 true 表示候选已被占用
pub fn generate_unique_id<F>(prefix: &str, length: usize, mut exists: F) -> ApiResult<String>
where
    F: FnMut(&str) -> ApiResult<bool>,
{
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let candidate = generate_id(prefix, length);
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        tracing::debug!(attempt, candidate = %candidate, "标识冲突，重新生成");
    }
    Err(ApiError::InternalError(format!(
        "连续 {} 次生成的标识均已存在 (prefix={}, length={})",
        MAX_GENERATION_ATTEMPTS, prefix, length
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generate_id("WR", 8);
        assert_eq!(id.len(), 10);
        assert!(id.starts_with("WR"));
        assert!(id[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_collision_is_regenerated() {
        let mut calls = 0;
        let id = generate_unique_id("", 6, |_| {
            calls += 1;
            Ok(calls < 3)
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(id.len(), 6);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let err = generate_unique_id("", 6, |_| Ok(true)).unwrap_err();
        assert!(matches!(err, ApiError::InternalError(_)));
    }
}
