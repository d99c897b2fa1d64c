// ==========================================
// HTM Vault - 请求属性校验
// ==========================================
// 职责: 边界处的属性校验与解析（文本、日期、枚举）
// 失败: 一律返回 ApiError::InvalidAttribute
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use std::fmt::Display;
use std::str::FromStr;

/// 日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日期时间可接受的格式（T 分隔或空格分隔，可带秒）
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 当前本地时间（截断到秒）
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 今天（本地）
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 是否为空白
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// 非空白，且只含 ASCII 字母数字、空格、短横线
pub fn validate_attribute(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(field, "不能为空"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == ' ' || *c == '-'))
    {
        return Err(ApiError::invalid(
            field,
            format!("'{}' 含非法字符 '{}'（仅允许字母、数字、空格、短横线）", value, bad),
        ));
    }
    Ok(())
}

/// 必填文本（只校验非空白）
pub fn require_non_blank(field: &str, value: Option<&str>) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::invalid(field, "不能为空")),
    }
}

/// 解析 YYYY-MM-DD，且不晚于 today
pub fn parse_past_date(field: &str, raw: &str, today: NaiveDate) -> ApiResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::invalid(field, format!("'{}' 必须为 YYYY-MM-DD 格式", raw)))?;
    if date > today {
        return Err(ApiError::invalid(field, format!("{} 不能是未来日期", date)));
    }
    Ok(date)
}

/// 解析日期时间，且不晚于 now
pub fn parse_past_date_time(field: &str, raw: &str, now: NaiveDateTime) -> ApiResult<NaiveDateTime> {
    let trimmed = raw.trim();
    let parsed = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            ApiError::invalid(field, format!("'{}' 必须为 YYYY-MM-DDTHH:MM:SS 格式", raw))
        })?;
    if parsed > now {
        return Err(ApiError::invalid(field, format!("{} 不能是未来时间", parsed)));
    }
    Ok(parsed)
}

/// 解析封闭枚举（去除首尾空白，区分大小写）
pub fn parse_enum<T>(field: &str, raw: &str) -> ApiResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid(field, "不能为空"));
    }
    trimmed
        .parse::<T>()
        .map_err(|e| ApiError::invalid(field, e.to_string()))
}
