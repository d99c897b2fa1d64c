// ==========================================
// HTM Vault - 维护推进器
// ==========================================
// 职责: 工单关闭后推进设备的合规截止日 / 下次 PM 到期日 / 上次 PM 完成日
// 适用: 已关闭的 PREVENTATIVE_MAINTENANCE 或 ACCEPTANCE_TESTING 工单
// 原则: 三个日期都不会回退；next_pm_due_date 只在能按原节奏推进时才推进
// ==========================================

use crate::domain::device::Device;
use crate::domain::work_order::WorkOrder;
use crate::engine::date_math::last_day_of_month_after;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceAdvancer;

impl MaintenanceAdvancer {
    pub fn new() -> Self {
        Self
    }

    /// 计算推进后的设备
    ///
    /// # 返回
    /// - `None`: 工单不适用（未关闭、类型不推进维护、或缺少完成时间）
    /// - `Some(device)`: 需要保存的设备（字段可能与输入相同）
    #[instrument(level = "debug", skip(self, device, work_order), fields(
        work_order_id = %work_order.work_order_id,
        control_number = %device.control_number
    ))]
    pub fn advance(&self, device: &Device, work_order: &WorkOrder) -> Option<Device> {
        if !work_order.is_closed() || !work_order.work_order_type.advances_maintenance() {
            return None;
        }
        let completion_date = work_order.completion_date_time?.date();

        let mut updated = device.clone();
        let freq = device.maintenance_frequency_months();

        if freq > 0 {
            let proposed_compliance = last_day_of_month_after(completion_date, freq);
            let compliance = match updated.compliance_through_date {
                Some(existing) if existing >= proposed_compliance => existing,
                _ => proposed_compliance,
            };
            updated.compliance_through_date = Some(compliance);

            updated.next_pm_due_date = match updated.next_pm_due_date {
                None => Some(compliance),
                Some(current) => {
                    let proposed_next = last_day_of_month_after(current, freq);
                    if proposed_next <= compliance {
                        Some(proposed_next)
                    } else {
                        // 推进会逾期，保持原计划
                        Some(current)
                    }
                }
            };
        }

        if updated
            .last_pm_completion_date
            .map(|last| completion_date > last)
            .unwrap_or(true)
        {
            updated.last_pm_completion_date = Some(completion_date);
        }

        tracing::debug!(
            freq,
            compliance_through_date = ?updated.compliance_through_date,
            next_pm_due_date = ?updated.next_pm_due_date,
            last_pm_completion_date = ?updated.last_pm_completion_date,
            "维护日期推进完成"
        );

        Some(updated)
    }
}
