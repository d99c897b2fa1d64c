// ==========================================
// HTM Vault - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod device;
pub mod reference;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use device::{Actor, Device};
pub use reference::{FacilityDepartment, FacilityDepartments, ManufacturerModel, ManufacturerModels};
pub use types::{
    ServiceStatus, SortOrder, UnknownVariant, WorkOrderAwaitStatus, WorkOrderCompletionStatus,
    WorkOrderType,
};
pub use work_order::WorkOrder;
