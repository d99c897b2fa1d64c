// ==========================================
// HTM Vault - 日历运算
// ==========================================
// 职责: 纯日期运算，无副作用
// ==========================================

use chrono::{Datelike, Months, NaiveDate};

/// 所在月的第一天
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `date` 所在月之后第 `months` 个月的最后一天
///
/// 做法: 截断到月初 → 前进 months + 1 个月 → 减一天。
/// 超出 chrono 可表示范围时饱和到 `NaiveDate::MAX`。
///
/// # 示例
/// - 2023-06-10, 6 → 2023-12-31
/// - 2023-08-31, 6 → 2024-02-29
pub fn last_day_of_month_after(date: NaiveDate, months: u32) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(months.saturating_add(1)))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
