// ==========================================
// HTM Vault - 设备领域模型
// ==========================================
// 职责: 设备台账实体
// 不变量:
// - compliance_through_date / next_pm_due_date 由合规调度器派生
// - RETIRED 设备除重新启用外不可修改
// - last_pm_completion_date 仅由关闭 PM 工单推进
// ==========================================

use crate::domain::reference::ManufacturerModel;
use crate::domain::types::ServiceStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 已认证的操作人（由调用方提供）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ==========================================
// Device - 设备
// ==========================================
// 对齐: device 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    // ===== 主键 =====
    pub control_number: String,

    // ===== 识别信息 =====
    pub serial_number: String,
    pub manufacturer_model: ManufacturerModel, // 按值复制的参考数据
    pub manufacture_date: Option<NaiveDate>,

    // ===== 状态与位置 =====
    pub service_status: ServiceStatus,
    pub facility_name: String,
    pub assigned_department: String,

    // ===== 维保日期 =====
    pub compliance_through_date: Option<NaiveDate>,
    pub last_pm_completion_date: Option<NaiveDate>,
    pub next_pm_due_date: Option<NaiveDate>,

    // ===== 入账信息（创建后不可变）=====
    pub inventory_add_date: NaiveDate,
    pub added_by: Actor,

    pub notes: String,
}

impl Device {
    /// 有效维护周期（月）
    pub fn maintenance_frequency_months(&self) -> u32 {
        self.manufacturer_model.effective_frequency_months()
    }

    pub fn is_retired(&self) -> bool {
        self.service_status == ServiceStatus::Retired
    }
}
