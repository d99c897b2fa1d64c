// ==========================================
// HTM Vault - 合规调度器
// ==========================================
// 职责: 由维护周期与 PM 历史推导
//       compliance_through_date / next_pm_due_date
// 输入: 调用方已校验，无失败分支
// 注意: next_pm_due_date 只与新算出的合规截止日比较（只会提前，不会推后），
//       不依据 last_pm_completion_date 重新推导
// ==========================================

use crate::engine::date_math::last_day_of_month_after;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 合规调度结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceDates {
    pub compliance_through_date: Option<NaiveDate>,
    pub next_pm_due_date: Option<NaiveDate>,
}

impl ComplianceDates {
    pub const NONE: ComplianceDates = ComplianceDates {
        compliance_through_date: None,
        next_pm_due_date: None,
    };
}

// ==========================================
// ComplianceScheduler - 合规调度器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceScheduler;

impl ComplianceScheduler {
    pub fn new() -> Self {
        Self
    }

    /// 重新计算合规日期
    ///
    /// 规则（顺序执行，命中即返回）:
    /// 1) 周期为 0 或缺省 → (None, None)
    /// 2) 无 PM 历史 → (None, inventory_add_date)，入账起即到期
    /// 3) 合规截止日 = 上次 PM 所在月之后第 freq 个月的月末
    ///    - 现有 next 为空 → next = 合规截止日
    ///    - 现有 next 晚于合规截止日 → 提前到合规截止日
    ///    - 否则保持现有 next
    #[instrument(level = "debug", skip(self))]
    pub fn recompute(
        &self,
        freq_months: Option<u32>,
        last_pm_completion_date: Option<NaiveDate>,
        existing_next_pm_due_date: Option<NaiveDate>,
        inventory_add_date: NaiveDate,
    ) -> ComplianceDates {
        let freq = match freq_months {
            Some(f) if f > 0 => f,
            _ => return ComplianceDates::NONE,
        };

        let last_pm = match last_pm_completion_date {
            Some(d) => d,
            None => {
                return ComplianceDates {
                    compliance_through_date: None,
                    next_pm_due_date: Some(inventory_add_date),
                }
            }
        };

        let compliance_through = last_day_of_month_after(last_pm, freq);

        let next_pm_due = match existing_next_pm_due_date {
            None => compliance_through,
            Some(existing) if existing > compliance_through => compliance_through,
            Some(existing) => existing,
        };

        tracing::debug!(
            freq,
            %last_pm,
            %compliance_through,
            %next_pm_due,
            "合规日期重算完成"
        );

        ComplianceDates {
            compliance_through_date: Some(compliance_through),
            next_pm_due_date: Some(next_pm_due),
        }
    }
}
