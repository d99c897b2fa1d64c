// ==========================================
// HTM Vault - 工单领域模型
// ==========================================
// 状态机: OPEN --close--> CLOSED（终态），OPEN 可自更新
// 不变量: CLOSED 工单必有 summary 与 completion_date_time
// ==========================================

use crate::domain::device::{Actor, Device};
use crate::domain::reference::ManufacturerModel;
use crate::domain::types::{WorkOrderAwaitStatus, WorkOrderCompletionStatus, WorkOrderType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkOrder - 工单
// ==========================================
// 对齐: work_order 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub work_order_id: String,
    pub work_order_type: WorkOrderType,

    // ===== 关联设备（创建时快照）=====
    pub control_number: String,
    pub serial_number: String,
    pub manufacturer_model: ManufacturerModel,
    pub facility_name: String,
    pub assigned_department: String,

    // ===== 状态 =====
    pub completion_status: WorkOrderCompletionStatus,
    pub await_status: Option<WorkOrderAwaitStatus>,

    // ===== 内容 =====
    pub problem_reported: String,
    pub problem_found: Option<String>,
    pub summary: Option<String>,
    pub completion_date_time: Option<NaiveDateTime>,

    // ===== 审计 =====
    pub created_by: Actor,
    pub created_at: NaiveDateTime,
    pub closed_by: Option<Actor>,
    pub closed_at: Option<NaiveDateTime>,
}

impl WorkOrder {
    /// 为设备开立新工单（OPEN，设备字段按当前值复制）
    pub fn open_for_device(
        work_order_id: String,
        work_order_type: WorkOrderType,
        device: &Device,
        problem_reported: String,
        problem_found: Option<String>,
        created_by: Actor,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            work_order_id,
            work_order_type,
            control_number: device.control_number.clone(),
            serial_number: device.serial_number.clone(),
            manufacturer_model: device.manufacturer_model.clone(),
            facility_name: device.facility_name.clone(),
            assigned_department: device.assigned_department.clone(),
            completion_status: WorkOrderCompletionStatus::Open,
            await_status: None,
            problem_reported,
            problem_found,
            summary: None,
            completion_date_time: None,
            created_by,
            created_at,
            closed_by: None,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completion_status == WorkOrderCompletionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.completion_status == WorkOrderCompletionStatus::Closed
    }

    /// summary 非空且 completion_date_time 已填写
    pub fn has_completion_details(&self) -> bool {
        let summary_ok = self
            .summary
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        summary_ok && self.completion_date_time.is_some()
    }
}
